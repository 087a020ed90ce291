//! Level mapping from edition-2 fixed-surface descriptors to edition-1
//! `{level type, level 1, level 2}` triples, including the unit scalings
//! (edition-2 Pa becomes edition-1 hPa, sigma values become integers,
//! and so on).

use crate::error::ConvertError;
use crate::grib2::ProductDefinition;
use crate::transcode::param::NCEP;

/// Returns the edition-1 `(level_type, level1, level2)` triple.
///
/// Edition 1 cannot express a layer bounded by two different level types;
/// such layers are fatal.
pub(crate) fn map_level(
    product: &ProductDefinition,
    centre: u16,
) -> Result<(u8, i32, i32), ConvertError> {
    let lvl1_type = product.first_surface.surface_type;
    let lvl2_type = product.second_surface.surface_type;
    if lvl2_type != 255 && lvl1_type != lvl2_type {
        return Err(ConvertError::HeterogeneousLevelTypes(lvl1_type, lvl2_type));
    }
    let lvl1 = product.first_surface.value;
    let lvl2 = product.second_surface.value;
    let single = lvl2_type == 255;

    let triple = match lvl1_type {
        1..=9 => (lvl1_type, 0, 0),
        20 => (20, 0, 0),
        // isobaric surface / layer: Pa to hPa (or kPa for layers)
        100 => {
            if single {
                (100, (lvl1 / 100.0) as i32, 0)
            } else {
                (101, (lvl1 / 1000.0) as i32, (lvl2 / 1000.0) as i32)
            }
        }
        101 => (102, 0, 0),
        102 => {
            if single {
                (103, lvl1 as i32, 0)
            } else {
                (104, (lvl1 / 100.0) as i32, (lvl2 / 100.0) as i32)
            }
        }
        103 => {
            if single {
                (105, lvl1 as i32, 0)
            } else {
                (106, (lvl1 / 100.0) as i32, (lvl2 / 100.0) as i32)
            }
        }
        104 => {
            if single {
                (107, (lvl1 * 10000.0) as i32, 0)
            } else {
                (108, (lvl1 * 100.0) as i32, (lvl2 * 100.0) as i32)
            }
        }
        105 => {
            if single {
                (109, lvl1 as i32, 0)
            } else {
                (110, lvl1 as i32, lvl2 as i32)
            }
        }
        106 => {
            if single {
                (111, (lvl1 * 100.0) as i32, 0)
            } else {
                (112, (lvl1 * 100.0) as i32, (lvl2 * 100.0) as i32)
            }
        }
        107 => {
            if single {
                (113, lvl1 as i32, 0)
            } else {
                (114, (475.0 - lvl1) as i32, (475.0 - lvl2) as i32)
            }
        }
        108 => {
            if single {
                (115, (lvl1 / 100.0) as i32, 0)
            } else {
                (116, (lvl1 / 100.0) as i32, (lvl2 / 100.0) as i32)
            }
        }
        109 => (117, (lvl1 * 1000000000.0) as i32, 0),
        111 => {
            if single {
                (119, (lvl1 * 10000.0) as i32, 0)
            } else {
                (120, (lvl1 * 100.0) as i32, (lvl2 * 100.0) as i32)
            }
        }
        117 => return Err(ConvertError::LevelNamedNotMapped("Mixed layer depth")),
        160 => (160, lvl1 as i32, 0),
        200 if centre == NCEP => (200, 0, 0),
        other => return Err(ConvertError::LevelNotMapped(other)),
    };
    Ok(triple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grib2::FixedSurface;

    fn product(lvl1_type: u8, lvl1: f64, lvl2_type: u8, lvl2: f64) -> ProductDefinition {
        ProductDefinition {
            template_num: 0,
            parameter_category: 0,
            parameter_number: 0,
            generating_process: 0,
            time_unit: 1,
            forecast_time: 0,
            first_surface: FixedSurface {
                surface_type: lvl1_type,
                value: lvl1,
            },
            second_surface: FixedSurface {
                surface_type: lvl2_type,
                value: lvl2,
            },
            ensemble: None,
            derived: None,
            statistical: None,
        }
    }

    #[test]
    fn surface_passes_through() {
        assert_eq!(map_level(&product(1, 0.0, 255, 0.0), 98), Ok((1, 0, 0)));
    }

    #[test]
    fn isobaric_pa_becomes_hpa() {
        assert_eq!(
            map_level(&product(100, 85000.0, 255, 0.0), 98),
            Ok((100, 850, 0))
        );
    }

    #[test]
    fn isobaric_layer_becomes_kpa_bounds() {
        assert_eq!(
            map_level(&product(100, 85000.0, 100, 50000.0), 98),
            Ok((101, 85, 50))
        );
    }

    #[test]
    fn height_above_ground_maps_to_105() {
        assert_eq!(
            map_level(&product(103, 2.0, 255, 0.0), 98),
            Ok((105, 2, 0))
        );
    }

    #[test]
    fn sigma_level_is_scaled() {
        assert_eq!(
            map_level(&product(104, 0.5, 255, 0.0), 98),
            Ok((107, 5000, 0))
        );
    }

    #[test]
    fn heterogeneous_layer_bounds_are_fatal() {
        assert_eq!(
            map_level(&product(100, 85000.0, 103, 2.0), 98),
            Err(ConvertError::HeterogeneousLevelTypes(100, 103))
        );
    }

    #[test]
    fn mixed_layer_depth_is_named() {
        let err = map_level(&product(117, 0.0, 255, 0.0), 98).unwrap_err();
        assert!(err.to_string().contains("Mixed layer depth"));
    }

    #[test]
    fn ncep_only_level_codes() {
        assert_eq!(map_level(&product(200, 0.0, 255, 0.0), 7), Ok((200, 0, 0)));
        assert_eq!(
            map_level(&product(200, 0.0, 255, 0.0), 98),
            Err(ConvertError::LevelNotMapped(200))
        );
    }
}
