// Tests for locations, timezone parsing and the sunrise-backed calculator
#[cfg(test)]
mod location_tests {
    use crate::geo::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Location::new(52.3676, 4.9041).is_ok());
        assert!(Location::new(90.0, 180.0).is_ok());
        assert!(Location::new(-90.0, -180.0).is_ok());

        assert!(Location::new(91.0, 0.0).is_err());
        assert!(Location::new(-91.0, 0.0).is_err());
        assert!(Location::new(0.0, 181.0).is_err());
        assert!(Location::new(0.0, -360.0).is_err());
        assert!(Location::new(f64::NAN, 0.0).is_err());
        assert!(Location::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_invalid_location_is_configuration_error() {
        let err = Location::new(123.0, 0.0).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn test_location_display() {
        let amsterdam = Location::new(52.3676, 4.9041).unwrap();
        assert_eq!(amsterdam.to_string(), "52.3676°N, 4.9041°E");

        let santiago = Location::new(-33.4489, -70.6693).unwrap();
        assert_eq!(santiago.to_string(), "33.4489°S, 70.6693°W");
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(
            parse_timezone("Europe/Amsterdam").unwrap(),
            chrono_tz::Europe::Amsterdam
        );
        assert_eq!(parse_timezone(" UTC ").unwrap(), chrono_tz::UTC);
        assert!(parse_timezone("Mars/Olympus_Mons").unwrap_err().is_configuration());
    }
}

#[cfg(test)]
mod solar_tests {
    use crate::error::SolarError;
    use crate::geo::*;
    use chrono::{NaiveDate, Timelike};

    fn calculator(lat: f64, lon: f64, tz: chrono_tz::Tz) -> SunriseCalculator {
        SunriseCalculator::new(Location::new(lat, lon).unwrap(), tz)
    }

    #[test]
    fn test_amsterdam_midsummer() {
        let calc = calculator(52.3676, 4.9041, chrono_tz::Europe::Amsterdam);
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let instants = calc.compute(date).unwrap();

        let sunrise = instants.sunrise.with_timezone(&chrono_tz::Europe::Amsterdam);
        let sunset = instants.sunset.with_timezone(&chrono_tz::Europe::Amsterdam);

        assert_eq!(instants.date, date);
        // Around 05:18 and 22:06 local time
        assert_eq!(sunrise.hour(), 5);
        assert_eq!(sunset.hour(), 22);
        assert_eq!(sunrise.date_naive(), date);
        assert_eq!(sunset.date_naive(), date);
    }

    #[test]
    fn test_sunrise_before_sunset_across_the_globe() {
        let places = [
            (1.3521, 103.8198, chrono_tz::Asia::Singapore),
            (-33.9249, 18.4241, chrono_tz::Africa::Johannesburg),
            (40.7128, -74.0060, chrono_tz::America::New_York),
            (-36.8485, 174.7633, chrono_tz::Pacific::Auckland),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        for (lat, lon, tz) in places {
            let instants = calculator(lat, lon, tz).compute(date).unwrap();
            assert!(instants.sunrise < instants.sunset, "{lat}, {lon}");
            assert_eq!(instants.sunrise.with_timezone(&tz).date_naive(), date);
            assert_eq!(instants.sunset.with_timezone(&tz).date_naive(), date);
        }
    }

    #[test]
    fn test_instants_fall_on_the_local_date() {
        // Zones far from their longitude's solar time, and a summer sunset
        // past local midnight
        let cases = [
            (-13.8333, -171.7667, chrono_tz::Pacific::Apia, (2024, 3, 2)),
            (1.8721, -157.4278, chrono_tz::Pacific::Kiritimati, (2024, 3, 2)),
            (-21.1394, -175.2049, chrono_tz::Pacific::Tongatapu, (2024, 9, 10)),
            (64.1466, -21.9426, chrono_tz::Atlantic::Reykjavik, (2024, 6, 18)),
            (64.1466, -21.9426, chrono_tz::Atlantic::Reykjavik, (2024, 6, 21)),
            (-36.8485, 174.7633, chrono_tz::Pacific::Auckland, (2024, 6, 18)),
        ];

        for (lat, lon, tz, (y, m, d)) in cases {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            let instants = calculator(lat, lon, tz).compute(date).unwrap();

            assert_eq!(instants.date, date);
            assert_eq!(
                instants.sunrise.with_timezone(&tz).date_naive(),
                date,
                "sunrise in {tz} on {date}"
            );
            assert_eq!(
                instants.sunset.with_timezone(&tz).date_naive(),
                date,
                "sunset in {tz} on {date}"
            );
        }
    }

    #[test]
    fn test_apia_sunrise_is_morning() {
        let tz = chrono_tz::Pacific::Apia;
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let instants = calculator(-13.8333, -171.7667, tz).compute(date).unwrap();

        // Around 06:29 and 18:49 local time
        assert_eq!(instants.sunrise.with_timezone(&tz).hour(), 6);
        assert_eq!(instants.sunset.with_timezone(&tz).hour(), 18);
    }

    #[test]
    fn test_reykjavik_midsummer_sunset_is_after_midnight() {
        let tz = chrono_tz::Atlantic::Reykjavik;
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let instants = calculator(64.1466, -21.9426, tz).compute(date).unwrap();

        // The sunset on this local date is the previous evening's
        assert!(instants.sunset < instants.sunrise);
        assert_eq!(instants.sunset.with_timezone(&tz).hour(), 0);
    }

    #[test]
    fn test_calculation_is_pure() {
        let calc = calculator(48.8566, 2.3522, chrono_tz::Europe::Paris);
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(calc.compute(date).unwrap(), calc.compute(date).unwrap());
    }

    #[test]
    fn test_polar_night_is_calculation_failure() {
        // Longyearbyen in midwinter: the sun stays below the horizon
        let calc = calculator(78.2232, 15.6267, chrono_tz::Arctic::Longyearbyen);
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();

        match calc.compute(date) {
            Err(SolarError::Calculation { date: failed, .. }) => assert_eq!(failed, date),
            other => panic!("expected calculation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_day_without_sunset_keeps_its_sunrise() {
        // The sunset moves from 23:59 on the 15th to 00:01 on the 17th
        let tz = chrono_tz::Atlantic::Reykjavik;
        let calc = calculator(64.1466, -21.9426, tz);
        let date = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        let instants = calc.compute(date).unwrap();

        assert_eq!(instants.sunrise.with_timezone(&tz).date_naive(), date);
        let next = calc.compute(date.succ_opt().unwrap()).unwrap();
        assert_eq!(instants.sunset, next.sunset);
    }

    #[test]
    fn test_midnight_sun_is_calculation_failure() {
        let calc = calculator(78.2232, 15.6267, chrono_tz::Arctic::Longyearbyen);
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        assert!(matches!(
            calc.compute(date),
            Err(SolarError::Calculation { .. })
        ));
    }
}
