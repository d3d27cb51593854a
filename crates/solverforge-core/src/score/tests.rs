//! Tests for score types.

use rust_decimal::Decimal;

use super::*;

mod integer_scores {
    use super::*;

    #[test]
    fn test_ordering_compares_hard_level_first() {
        let infeasible = HardSoftScore::of(-1, 0);
        let feasible = HardSoftScore::of(0, -1000);
        assert!(feasible > infeasible);
        assert!(!infeasible.is_feasible());
        assert!(feasible.is_feasible());
    }

    #[test]
    fn test_arithmetic() {
        let a = HardMediumSoftScore::of(1, 2, 3);
        let b = HardMediumSoftScore::of(0, 5, -1);
        assert_eq!(a + b, HardMediumSoftScore::of(1, 7, 2));
        assert_eq!(a - b, HardMediumSoftScore::of(1, -3, 4));
        assert_eq!(-a, HardMediumSoftScore::of(-1, -2, -3));
        let total: HardSoftScore = vec![HardSoftScore::ONE_HARD, HardSoftScore::ONE_SOFT]
            .into_iter()
            .sum();
        assert_eq!(total, HardSoftScore::of(1, 1));
    }

    #[test]
    fn test_multiply() {
        assert_eq!(HardSoftScore::ONE_HARD.multiply(3), HardSoftScore::of_hard(3));
        assert_eq!(SimpleScore::of(3).multiply(-2), SimpleScore::of(-6));
        assert_eq!(
            SimpleScore::of(3).multiply_decimal(Decimal::new(15, 1)),
            SimpleScore::of(5)
        );
    }

    #[test]
    fn test_display_and_short_string() {
        let score = HardSoftScore::of(-2, 0);
        assert_eq!(score.to_string(), "-2hard/0soft");
        assert_eq!(score.to_short_string(), "-2hard");
        assert_eq!(HardSoftScore::ZERO.to_short_string(), "0");
        assert_eq!(format!("{:?}", SimpleScore::of(4)), "SimpleScore(4)");
    }

    #[test]
    fn test_parse() {
        assert_eq!(SimpleScore::parse("-10").unwrap(), SimpleScore::of(-10));
        assert_eq!(
            "-1hard/-20soft".parse::<HardSoftScore>().unwrap(),
            HardSoftScore::of(-1, -20)
        );
        assert_eq!(
            HardMediumSoftScore::parse("0hard/1medium/2soft").unwrap(),
            HardMediumSoftScore::of(0, 1, 2)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(HardSoftScore::parse("1hard").is_err());
        assert!(HardSoftScore::parse("1hard/xsoft").is_err());
        assert!(HardSoftScore::parse("1soft/2hard").is_err());
    }

    #[test]
    fn test_level_numbers() {
        assert_eq!(
            HardSoftScore::of(-3, 4).to_level_numbers(),
            vec![Decimal::from(-3), Decimal::from(4)]
        );
        assert_eq!(HardMediumSoftScore::levels_count(), 3);
        assert!(!HardSoftScore::DECIMAL);
    }
}

mod decimal_scores {
    use super::*;

    #[test]
    fn test_multiply_decimal_keeps_fraction() {
        let impact = HardSoftDecimalScore::ONE_SOFT.multiply_decimal(Decimal::new(1414, 3));
        assert_eq!(impact, HardSoftDecimalScore::of_soft(Decimal::new(1414, 3)));
        assert!(HardSoftDecimalScore::DECIMAL);
    }

    #[test]
    fn test_parse_and_display() {
        let score = HardSoftDecimalScore::parse("-1.5hard/2.25soft").unwrap();
        assert_eq!(score.hard(), Decimal::new(-15, 1));
        assert_eq!(score.soft(), Decimal::new(225, 2));
        assert_eq!(score.to_string(), "-1.5hard/2.25soft");
    }

    #[test]
    fn test_zero() {
        assert!(SimpleDecimalScore::zero().is_zero());
        assert_eq!(HardMediumSoftDecimalScore::ZERO.to_short_string(), "0");
    }
}
