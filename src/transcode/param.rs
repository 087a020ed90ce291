//! Parameter mapping from edition-2 `{discipline, category, number}`
//! triples to edition-1 parameter codes (GRIB1 table version 3), with
//! NCEP-specific extensions layered on top for originating centre 7.

use crate::error::ConvertError;

pub(crate) const NCEP: u16 = 7;

fn unmapped(discipline: u8, category: u8, number: u8) -> ConvertError {
    ConvertError::ParameterCodeNotMapped {
        discipline,
        category,
        number,
    }
}

/// Maps one parameter triple to its edition-1 code.
///
/// A known parameter without an edition-1 counterpart fails with an error
/// naming the parameter; an unknown triple fails with an error naming the
/// triple.
pub(crate) fn map_parameter(
    centre: u16,
    discipline: u8,
    category: u8,
    number: u8,
) -> Result<u8, ConvertError> {
    match (discipline, category) {
        // meteorological products
        (0, 0) => met_temperature(centre, number),
        (0, 1) => met_moisture(centre, number),
        (0, 2) => met_momentum(centre, number),
        (0, 3) => met_mass(centre, number),
        (0, 4) => met_short_wave_radiation(centre, number),
        (0, 5) => met_long_wave_radiation(centre, number),
        (0, 6) => met_cloud(centre, number),
        (0, 7) => met_stability(centre, number),
        (0, 13) => met_aerosol(number),
        (0, 14) => met_trace_gas(centre, number),
        (0, 15) => met_radar(number),
        (0, 19) => met_atmosphere_physics(centre, number),
        // hydrologic products
        (1, 0) => hydro_basic(centre, number),
        (1, 1) => hydro_probability(centre, number),
        // land surface products
        (2, 0) => land_vegetation(centre, number),
        // oceanographic products
        (10, 0) => ocean_waves(number),
        (10, 1) => ocean_currents(number),
        (10, 2) => ocean_ice(number),
        (10, 3) => ocean_surface(number),
        (10, 4) => ocean_subsurface(number),
        _ => Err(unmapped(discipline, category, number)),
    }
}

fn met_temperature(centre: u16, number: u8) -> Result<u8, ConvertError> {
    let name = match number {
        0 => return Ok(11),
        1 => return Ok(12),
        2 => return Ok(13),
        3 => return Ok(14),
        4 => return Ok(15),
        5 => return Ok(16),
        6 => return Ok(17),
        7 => return Ok(18),
        8 => return Ok(19),
        9 => return Ok(25),
        10 => return Ok(121),
        11 => return Ok(122),
        12 => "Heat index",
        13 => "Wind chill factor",
        14 => "Minimum dew point depression",
        15 => "Virtual potential temperature",
        16 => "Snow phase change heat flux",
        192 if centre == NCEP => return Ok(229),
        _ => return Err(unmapped(0, 0, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn met_moisture(centre: u16, number: u8) -> Result<u8, ConvertError> {
    if centre == NCEP {
        match number {
            22 => return Ok(153),
            192 => return Ok(140),
            193 => return Ok(141),
            194 => return Ok(142),
            195 => return Ok(143),
            196 => return Ok(214),
            197 => return Ok(135),
            199 => return Ok(228),
            200 => return Ok(145),
            201 => return Ok(238),
            206 => return Ok(186),
            207 => return Ok(198),
            208 => return Ok(239),
            213 => return Ok(243),
            214 => return Ok(245),
            215 => return Ok(249),
            216 => return Ok(159),
            _ => {}
        }
    }
    let name = match number {
        0 => return Ok(51),
        1 => return Ok(52),
        2 => return Ok(53),
        3 => return Ok(54),
        4 => return Ok(55),
        5 => return Ok(56),
        6 => return Ok(57),
        7 => return Ok(59),
        8 => return Ok(61),
        9 => return Ok(62),
        10 => return Ok(63),
        11 => return Ok(66),
        12 => return Ok(64),
        13 => return Ok(65),
        14 => return Ok(78),
        15 => return Ok(79),
        16 => return Ok(99),
        17 => "Snow age",
        18 => "Absolute humidity",
        19 => "Precipitation type",
        20 => "Integrated liquid water",
        21 => "Condensate water",
        22 => "Cloud mixing ratio",
        23 => "Ice water mixing ratio",
        24 => "Rain mixing ratio",
        25 => "Snow mixing ratio",
        26 => "Horizontal moisture convergence",
        27 => "Maximum relative humidity",
        28 => "Maximum absolute humidity",
        29 => "Total snowfall",
        30 => "Precipitable water category",
        31 => "Hail",
        32 => "Graupel (snow pellets)",
        33 => "Categorical rain",
        34 => "Categorical freezing rain",
        35 => "Categorical ice pellets",
        36 => "Categorical snow",
        37 => "Convective precipitation rate",
        38 => "Horizontal moisture divergence",
        39 => "Percent frozen precipitation",
        40 => "Potential evaporation",
        41 => "Potential evaporation rate",
        42 => "Snow cover",
        43 => "Rain fraction of total water",
        44 => "Rime factor",
        45 => "Total column integrated rain",
        46 => "Total column integrated snow",
        _ => return Err(unmapped(0, 1, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn met_momentum(centre: u16, number: u8) -> Result<u8, ConvertError> {
    if centre == NCEP {
        match number {
            22 => return Ok(180),
            192 => return Ok(136),
            193 => return Ok(172),
            194 => return Ok(196),
            195 => return Ok(197),
            196 => return Ok(252),
            197 => return Ok(253),
            _ => {}
        }
    }
    let name = match number {
        0 => return Ok(31),
        1 => return Ok(32),
        2 => return Ok(33),
        3 => return Ok(34),
        4 => return Ok(35),
        5 => return Ok(36),
        6 => return Ok(37),
        7 => return Ok(38),
        8 => return Ok(39),
        9 => return Ok(40),
        10 => return Ok(41),
        11 => return Ok(42),
        12 => return Ok(43),
        13 => return Ok(44),
        14 => return Ok(4),
        15 => return Ok(45),
        16 => return Ok(46),
        17 => return Ok(124),
        18 => return Ok(125),
        19 => return Ok(126),
        20 => return Ok(123),
        21 => "Maximum wind speed",
        22 => "Wind speed (gust)",
        23 => "u-component of wind (gust)",
        24 => "v-component of wind (gust)",
        25 => "Vertical speed shear",
        26 => "Horizontal momentum flux",
        27 => "u-component storm motion",
        28 => "v-component storm motion",
        29 => "Drag coefficient",
        30 => "Frictional velocity",
        _ => return Err(unmapped(0, 2, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn met_mass(centre: u16, number: u8) -> Result<u8, ConvertError> {
    if centre == NCEP {
        match number {
            192 => return Ok(130),
            193 => return Ok(222),
            194 => return Ok(147),
            195 => return Ok(148),
            196 => return Ok(221),
            197 => return Ok(230),
            198 => return Ok(129),
            199 => return Ok(137),
            _ => {}
        }
    }
    let name = match number {
        0 => return Ok(1),
        1 => return Ok(2),
        2 => return Ok(3),
        3 => return Ok(5),
        4 => return Ok(6),
        5 => return Ok(7),
        6 => return Ok(8),
        7 => return Ok(9),
        8 => return Ok(26),
        9 => return Ok(27),
        10 => return Ok(89),
        11 => "Altimeter setting",
        12 => "Thickness",
        13 => "Pressure altitude",
        14 => "Density altitude",
        15 => "5-wave geopotential height",
        16 => "Zonal flux of gravity wave stress",
        17 => "Meridional flux of gravity wave stress",
        18 => "Planetary boundary layer height",
        19 => "5-wave geopotential height anomaly",
        _ => return Err(unmapped(0, 3, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn met_short_wave_radiation(centre: u16, number: u8) -> Result<u8, ConvertError> {
    if centre == NCEP {
        match number {
            192 => return Ok(204),
            193 => return Ok(211),
            196 => return Ok(161),
            _ => {}
        }
    }
    let name = match number {
        0 => return Ok(111),
        1 => return Ok(113),
        2 => return Ok(116),
        3 => return Ok(117),
        4 => return Ok(118),
        5 => return Ok(119),
        6 => return Ok(120),
        7 => "Downward short-wave radiation flux",
        8 => "Upward short-wave radiation flux",
        _ => return Err(unmapped(0, 4, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn met_long_wave_radiation(centre: u16, number: u8) -> Result<u8, ConvertError> {
    if centre == NCEP {
        match number {
            192 => return Ok(205),
            193 => return Ok(212),
            _ => {}
        }
    }
    let name = match number {
        0 => return Ok(112),
        1 => return Ok(114),
        2 => return Ok(115),
        3 => "Downward long-wave radiation flux",
        4 => "Upward long-wave radiation flux",
        _ => return Err(unmapped(0, 5, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn met_cloud(centre: u16, number: u8) -> Result<u8, ConvertError> {
    if centre == NCEP {
        match number {
            192 => return Ok(213),
            193 => return Ok(146),
            _ => {}
        }
    }
    let name = match number {
        0 => return Ok(58),
        1 => return Ok(71),
        2 => return Ok(72),
        3 => return Ok(73),
        4 => return Ok(74),
        5 => return Ok(75),
        6 => return Ok(76),
        7 => "Cloud amount",
        8 => "Cloud type",
        9 => "Thunderstorm maximum tops",
        10 => "Thunderstorm coverage",
        11 => "Cloud base",
        12 => "Cloud top",
        13 => "Ceiling",
        14 => "Non-convective cloud cover",
        15 => "Cloud work function",
        16 => "Convective cloud efficiency",
        17 => "Total condensate",
        18 => "Total column-integrated cloud water",
        19 => "Total column-integrated cloud ice",
        20 => "Total column-integrated cloud condensate",
        21 => "Ice fraction of total condensate",
        _ => return Err(unmapped(0, 6, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn met_stability(centre: u16, number: u8) -> Result<u8, ConvertError> {
    if centre == NCEP {
        match number {
            6 => return Ok(157),
            7 => return Ok(156),
            8 => return Ok(190),
            192 => return Ok(131),
            193 => return Ok(132),
            194 => return Ok(254),
            _ => {}
        }
    }
    let name = match number {
        0 => return Ok(24),
        1 => return Ok(77),
        2 => "K index",
        3 => "KO index",
        4 => "Total totals index",
        5 => "Sweat index",
        6 => "Convective available potential energy",
        7 => "Convective inhibition",
        8 => "Storm-relative helicity",
        9 => "Energy helicity index",
        10 => "Surface lifted index",
        11 => "Best (4-layer) lifted index",
        12 => "Richardson number",
        _ => return Err(unmapped(0, 7, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn met_aerosol(number: u8) -> Result<u8, ConvertError> {
    match number {
        0 => Err(ConvertError::ParameterNotMapped("Aerosol type")),
        _ => Err(unmapped(0, 13, number)),
    }
}

fn met_trace_gas(centre: u16, number: u8) -> Result<u8, ConvertError> {
    match number {
        0 => Ok(10),
        1 => Err(ConvertError::ParameterNotMapped("Ozone mixing ratio")),
        192 if centre == NCEP => Ok(154),
        _ => Err(unmapped(0, 14, number)),
    }
}

fn met_radar(number: u8) -> Result<u8, ConvertError> {
    let name = match number {
        6 => return Ok(21),
        7 => return Ok(22),
        8 => return Ok(23),
        0 => "Base spectrum width",
        1 => "Base reflectivity",
        2 => "Base radial velocity",
        3 => "Vertically-integrated liquid",
        4 => "Layer-maximum base reflectivity",
        5 => "Radar precipitation",
        _ => return Err(unmapped(0, 15, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn met_atmosphere_physics(centre: u16, number: u8) -> Result<u8, ConvertError> {
    if centre == NCEP && number == 204 {
        return Ok(209);
    }
    let name = match number {
        0 => return Ok(20),
        1 => return Ok(84),
        2 => return Ok(60),
        3 => return Ok(67),
        4 => "Volcanic ash",
        5 => "Icing top",
        6 => "Icing base",
        7 => "Icing",
        8 => "Turbulence top",
        9 => "Turbulence base",
        10 => "Turbulence",
        11 => "Turbulent kinetic energy",
        12 => "Planetary boundary layer regime",
        13 => "Contrail intensity",
        14 => "Contrail engine type",
        15 => "Contrail top",
        16 => "Contrail base",
        17 => "Maximum snow albedo",
        18 => "Snow-free albedo",
        _ => return Err(unmapped(0, 19, number)),
    };
    Err(ConvertError::ParameterNotMapped(name))
}

fn hydro_basic(centre: u16, number: u8) -> Result<u8, ConvertError> {
    match number {
        192 if centre == NCEP => Ok(234),
        193 if centre == NCEP => Ok(235),
        _ => Err(unmapped(1, 0, number)),
    }
}

fn hydro_probability(centre: u16, number: u8) -> Result<u8, ConvertError> {
    match number {
        192 if centre == NCEP => Ok(194),
        193 if centre == NCEP => Ok(195),
        _ => Err(unmapped(1, 1, number)),
    }
}

fn land_vegetation(centre: u16, number: u8) -> Result<u8, ConvertError> {
    if centre == NCEP {
        match number {
            192 => return Ok(144),
            193 => return Ok(155),
            194 => return Ok(207),
            195 => return Ok(208),
            196 => return Ok(223),
            197 => return Ok(226),
            198 => return Ok(225),
            207 => return Ok(201),
            _ => {}
        }
    }
    match number {
        0 => Ok(81),
        1 => Ok(83),
        2 => Ok(85),
        3 => Ok(86),
        4 => Ok(87),
        5 => Ok(90),
        _ => Err(unmapped(2, 0, number)),
    }
}

fn ocean_waves(number: u8) -> Result<u8, ConvertError> {
    match number {
        0 => Ok(28),
        1 => Ok(29),
        2 => Ok(30),
        3 => Ok(100),
        4 => Ok(101),
        5 => Ok(102),
        6 => Ok(103),
        7 => Ok(104),
        8 => Ok(105),
        9 => Ok(106),
        10 => Ok(107),
        11 => Ok(108),
        12 => Ok(109),
        13 => Ok(110),
        _ => Err(unmapped(10, 0, number)),
    }
}

fn ocean_currents(number: u8) -> Result<u8, ConvertError> {
    match number {
        0 => Ok(47),
        1 => Ok(48),
        2 => Ok(49),
        3 => Ok(50),
        _ => Err(unmapped(10, 1, number)),
    }
}

fn ocean_ice(number: u8) -> Result<u8, ConvertError> {
    match number {
        0 => Ok(91),
        1 => Ok(92),
        2 => Ok(93),
        3 => Ok(94),
        4 => Ok(95),
        5 => Ok(96),
        6 => Ok(97),
        7 => Ok(98),
        _ => Err(unmapped(10, 2, number)),
    }
}

fn ocean_surface(number: u8) -> Result<u8, ConvertError> {
    match number {
        0 => Ok(80),
        1 => Ok(82),
        _ => Err(unmapped(10, 3, number)),
    }
}

fn ocean_subsurface(number: u8) -> Result<u8, ConvertError> {
    match number {
        0 => Ok(69),
        1 => Ok(70),
        2 => Ok(68),
        3 => Ok(88),
        _ => Err(unmapped(10, 4, number)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_maps_to_code_11() {
        assert_eq!(map_parameter(98, 0, 0, 0), Ok(11));
    }

    #[test]
    fn heat_index_is_named_in_the_error() {
        let err = map_parameter(98, 0, 0, 12).unwrap_err();
        assert_eq!(err, ConvertError::ParameterNotMapped("Heat index"));
        assert!(err.to_string().contains("Heat index"));
    }

    #[test]
    fn ncep_extension_applies_only_to_centre_7() {
        assert_eq!(map_parameter(NCEP, 0, 0, 192), Ok(229));
        assert_eq!(
            map_parameter(98, 0, 0, 192),
            Err(unmapped(0, 0, 192)),
        );
    }

    #[test]
    fn ncep_override_takes_precedence_over_the_named_error() {
        assert_eq!(map_parameter(NCEP, 0, 1, 22), Ok(153));
        assert_eq!(
            map_parameter(98, 0, 1, 22),
            Err(ConvertError::ParameterNotMapped("Cloud mixing ratio")),
        );
        assert_eq!(map_parameter(NCEP, 0, 2, 22), Ok(180));
        assert_eq!(map_parameter(NCEP, 0, 7, 6), Ok(157));
    }

    #[test]
    fn unknown_triple_is_spelled_out() {
        let err = map_parameter(98, 3, 1, 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "There is no GRIB1 parameter code for discipline 3, \
             parameter category 1, parameter number 4"
        );
    }

    #[test]
    fn ocean_waves_map() {
        assert_eq!(map_parameter(98, 10, 0, 0), Ok(28));
        assert_eq!(map_parameter(98, 10, 4, 2), Ok(68));
    }
}
