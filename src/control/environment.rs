use crate::constants::{
    AIR_GAS_CONSTANT, AIR_HEAT_RATIO, GRAVITY, SEA_LEVEL_PRESSURE, SEA_LEVEL_TEMPERATURE,
    TROPOPAUSE_PRESSURE, TROPOPAUSE_TEMPERATURE, TROPOSPHERE_HEIGHT, TROPOSPHERE_TEMP_GRADIENT,
};

/// Local air properties at one altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereState {
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    pub speed_of_sound: f64,
}

impl AtmosphereState {
    pub fn dynamic_pressure(&self, velocity: f64) -> f64 {
        0.5 * self.density * velocity * velocity
    }
}

/// Standard atmosphere: lapse-rate troposphere, isothermal lower stratosphere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Atmosphere;

impl Atmosphere {
    pub fn at(&self, altitude: f64) -> AtmosphereState {
        let altitude = altitude.max(0.0);
        let (temperature, pressure) = if altitude < TROPOSPHERE_HEIGHT {
            let temperature = SEA_LEVEL_TEMPERATURE + TROPOSPHERE_TEMP_GRADIENT * altitude;
            let exponent = -GRAVITY / (TROPOSPHERE_TEMP_GRADIENT * AIR_GAS_CONSTANT);
            let pressure =
                SEA_LEVEL_PRESSURE * (temperature / SEA_LEVEL_TEMPERATURE).powf(exponent);
            (temperature, pressure)
        } else {
            let scale_height = AIR_GAS_CONSTANT * TROPOPAUSE_TEMPERATURE / GRAVITY;
            let above_tropopause = altitude - TROPOSPHERE_HEIGHT;
            let pressure = TROPOPAUSE_PRESSURE * (-above_tropopause / scale_height).exp();
            (TROPOPAUSE_TEMPERATURE, pressure)
        };

        AtmosphereState {
            temperature,
            pressure,
            density: pressure / (AIR_GAS_CONSTANT * temperature),
            speed_of_sound: (AIR_HEAT_RATIO * AIR_GAS_CONSTANT * temperature).sqrt(),
        }
    }
}
