//! Time-range mapping: edition-2 product templates and statistical
//! processing blocks become the edition-1 `{P1, P2, time range indicator}`
//! encoding.

use chrono::{Datelike, Timelike};

use crate::error::ConvertError;
use crate::grib2::{Grib2Message, ProductDefinition, StatisticalRange};
use crate::transcode::param::NCEP;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimeRange {
    pub(crate) t_range: u8,
    pub(crate) p1: i32,
    pub(crate) p2: i32,
    pub(crate) n_avg: i32,
    pub(crate) n_missing: i32,
}

/// Difference between the statistical end-of-range timestamp and the
/// message reference time, in the grid's own time unit.
fn map_statistical_end_time(
    msg: &Grib2Message,
    product: &ProductDefinition,
) -> Result<i32, ConvertError> {
    let stat = product
        .statistical
        .as_ref()
        .ok_or(ConvertError::ProductTemplateNotMapped(product.template_num))?;
    let end = &stat.end_time;
    let ref_time = &msg.ref_time;
    match product.time_unit {
        0 => Ok(i32::from(end.minute) - ref_time.minute() as i32),
        1 => Ok(i32::from(end.hour) - ref_time.hour() as i32),
        2 => Ok(i32::from(end.day) - ref_time.day() as i32),
        3 => Ok(i32::from(end.month) - ref_time.month() as i32),
        4 => Ok(i32::from(end.year) - ref_time.year()),
        unit => Err(ConvertError::EndTimeUnitNotMapped(unit)),
    }
}

/// Statistical process codes of the NCEP CFSR monthly products
/// (two-range, centre 7) and the edition-1 time range indicators they map
/// to.
fn map_cfsr_process(range: &StatisticalRange) -> Result<u8, ConvertError> {
    match range.process {
        193 => Ok(113),
        194 => Ok(123),
        195 => Ok(128),
        196 => Ok(129),
        197 => Ok(130),
        198 => Ok(131),
        199 => Ok(132),
        200 => Ok(133),
        201 => Ok(134),
        202 => Ok(135),
        203 => Ok(136),
        204 => Ok(137),
        205 => Ok(138),
        206 => Ok(139),
        207 => Ok(140),
        code => Err(ConvertError::NcepStatisticalProcessNotMapped(code)),
    }
}

pub(crate) fn map_time_range(
    msg: &Grib2Message,
    product: &ProductDefinition,
    centre: u16,
) -> Result<TimeRange, ConvertError> {
    match product.template_num {
        // instantaneous products
        0 | 1 | 2 => Ok(TimeRange {
            t_range: 0,
            p1: product.forecast_time as i32,
            p2: 0,
            n_avg: 0,
            n_missing: 0,
        }),
        // statistically processed products
        8 | 11 | 12 => {
            let stat = product
                .statistical
                .as_ref()
                .ok_or(ConvertError::ProductTemplateNotMapped(product.template_num))?;
            if stat.ranges.len() > 1 {
                if centre == NCEP && stat.ranges.len() == 2 {
                    // NCEP CFSR monthly grids
                    let p2 = stat.ranges[0].increment_length as i32;
                    let p1 = p2 - stat.ranges[1].time_length as i32;
                    Ok(TimeRange {
                        t_range: map_cfsr_process(&stat.ranges[0])?,
                        p1,
                        p2,
                        n_avg: stat.ranges[0].time_length as i32,
                        n_missing: stat.num_missing as i32,
                    })
                } else {
                    Err(ConvertError::MultipleStatisticalProcesses(stat.ranges.len()))
                }
            } else {
                let range = stat
                    .ranges
                    .first()
                    .ok_or(ConvertError::MultipleStatisticalProcesses(0))?;
                let t_range = match range.process {
                    0 => 3, // average
                    1 => 4, // accumulation
                    4 => 5, // difference
                    2 | 3 => 2,
                    // NCEP max/min temperature grids carry process code 255
                    255 if centre == NCEP
                        && msg.discipline == 0
                        && product.parameter_category == 0
                        && matches!(product.parameter_number, 4 | 5) =>
                    {
                        2
                    }
                    code => return Err(ConvertError::StatisticalProcessNotMapped(code)),
                };
                if range.increment_length != 0 {
                    return Err(ConvertError::DiscreteProcessing);
                }
                Ok(TimeRange {
                    t_range,
                    p1: product.forecast_time as i32,
                    p2: map_statistical_end_time(msg, product)?,
                    n_avg: 0,
                    n_missing: stat.num_missing as i32,
                })
            }
        }
        n => Err(ConvertError::ProductTemplateNotMapped(n)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::grib2::{
        FixedSurface, StatEndTime, StatisticalProcessing,
    };

    fn message(discipline: u8) -> Grib2Message {
        Grib2Message {
            discipline,
            total_len: 0,
            centre_id: NCEP,
            sub_centre_id: 0,
            master_table_version: 2,
            local_table_version: 1,
            ref_time_significance: 1,
            ref_time: Utc.with_ymd_and_hms(2010, 3, 1, 6, 0, 0).unwrap(),
            prod_status: 0,
            data_type: 1,
            local_use: None,
            grids: Vec::new(),
        }
    }

    fn product(template_num: u16, stat: Option<StatisticalProcessing>) -> ProductDefinition {
        ProductDefinition {
            template_num,
            parameter_category: 0,
            parameter_number: 0,
            generating_process: 96,
            time_unit: 1,
            forecast_time: 6,
            first_surface: FixedSurface {
                surface_type: 1,
                value: 0.0,
            },
            second_surface: FixedSurface {
                surface_type: 255,
                value: 0.0,
            },
            ensemble: None,
            derived: None,
            statistical: stat,
        }
    }

    fn stat_block(ranges: Vec<StatisticalRange>) -> StatisticalProcessing {
        StatisticalProcessing {
            end_time: StatEndTime {
                year: 2010,
                month: 3,
                day: 1,
                hour: 18,
                minute: 0,
                second: 0,
            },
            num_missing: 0,
            ranges,
        }
    }

    fn range(process: u8, time_length: u32, increment_length: u32) -> StatisticalRange {
        StatisticalRange {
            process,
            increment_type: 2,
            time_unit: 1,
            time_length,
            increment_unit: 1,
            increment_length,
        }
    }

    #[test]
    fn instantaneous_template_is_time_range_0() {
        let msg = message(0);
        let tr = map_time_range(&msg, &product(0, None), 98).unwrap();
        assert_eq!(
            tr,
            TimeRange {
                t_range: 0,
                p1: 6,
                p2: 0,
                n_avg: 0,
                n_missing: 0
            }
        );
    }

    #[test]
    fn accumulation_maps_to_time_range_4() {
        let msg = message(0);
        let stat = stat_block(vec![range(1, 12, 0)]);
        let tr = map_time_range(&msg, &product(8, Some(stat)), 98).unwrap();
        assert_eq!(tr.t_range, 4);
        assert_eq!(tr.p1, 6);
        // end hour 18 minus reference hour 6
        assert_eq!(tr.p2, 12);
    }

    #[test]
    fn average_and_difference_codes() {
        let msg = message(0);
        let avg = map_time_range(&msg, &product(8, Some(stat_block(vec![range(0, 12, 0)]))), 98)
            .unwrap();
        assert_eq!(avg.t_range, 3);
        let diff =
            map_time_range(&msg, &product(8, Some(stat_block(vec![range(4, 12, 0)]))), 98)
                .unwrap();
        assert_eq!(diff.t_range, 5);
        let max = map_time_range(&msg, &product(8, Some(stat_block(vec![range(2, 12, 0)]))), 98)
            .unwrap();
        assert_eq!(max.t_range, 2);
    }

    #[test]
    fn discrete_processing_is_fatal() {
        let msg = message(0);
        let stat = stat_block(vec![range(1, 12, 6)]);
        assert_eq!(
            map_time_range(&msg, &product(8, Some(stat)), 98),
            Err(ConvertError::DiscreteProcessing)
        );
    }

    #[test]
    fn cfsr_monthly_two_range_mapping() {
        let msg = message(0);
        let stat = stat_block(vec![range(194, 31, 744), range(0, 6, 0)]);
        let tr = map_time_range(&msg, &product(8, Some(stat)), NCEP).unwrap();
        assert_eq!(tr.t_range, 123);
        assert_eq!(tr.p2, 744);
        assert_eq!(tr.p1, 744 - 6);
        assert_eq!(tr.n_avg, 31);
    }

    #[test]
    fn multiple_ranges_without_ncep_are_fatal() {
        let msg = message(0);
        let stat = stat_block(vec![range(0, 31, 744), range(0, 6, 0)]);
        assert_eq!(
            map_time_range(&msg, &product(8, Some(stat)), 98),
            Err(ConvertError::MultipleStatisticalProcesses(2))
        );
    }

    #[test]
    fn ncep_max_min_patch() {
        let msg = message(0);
        let mut p = product(8, Some(stat_block(vec![range(255, 12, 0)])));
        p.parameter_number = 4;
        let tr = map_time_range(&msg, &p, NCEP).unwrap();
        assert_eq!(tr.t_range, 2);

        // any other parameter keeps the fatal path
        let mut p = product(8, Some(stat_block(vec![range(255, 12, 0)])));
        p.parameter_number = 0;
        assert_eq!(
            map_time_range(&msg, &p, NCEP),
            Err(ConvertError::StatisticalProcessNotMapped(255))
        );
    }
}
