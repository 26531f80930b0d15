// Coordinate value object

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_latitude_then_longitude() {
        let coordinates = Coordinates {
            latitude: 37.751,
            longitude: -97.822,
        };
        assert_eq!(coordinates.to_string(), "37.751,-97.822");
    }
}
