use crate::color::hex_to_rgb;

/// Look of a volumetric light cone: color, how fast it fades with distance,
/// and how sharply it fades toward the cone edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumetricSpotlight {
    pub light_color: [f32; 3],
    pub attenuation: f32,
    pub angle_power: f32,
}

impl Default for VolumetricSpotlight {
    fn default() -> Self {
        Self {
            light_color: [1.0, 1.0, 1.0],
            attenuation: 5.0,
            angle_power: 1.2,
        }
    }
}

impl VolumetricSpotlight {
    pub fn with_color(mut self, hex: u32) -> Self {
        self.light_color = hex_to_rgb(hex);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cone = VolumetricSpotlight::default();
        assert_eq!(cone.attenuation, 5.0);
        assert_eq!(cone.angle_power, 1.2);
        assert_eq!(cone.light_color, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_with_color_keeps_falloff() {
        let cone = VolumetricSpotlight::default().with_color(0xffcc00);
        assert_eq!(cone.light_color, hex_to_rgb(0xffcc00));
        assert_eq!(cone.attenuation, 5.0);
    }
}
