use geopipes_core::config::{parse_precision_model, parse_validity_mode};
use geopipes_core::models::{PrecisionModel, ValidityMode};
use proptest::prelude::*;

fn precision_model() -> impl Strategy<Value = PrecisionModel> {
    prop_oneof![
        Just(PrecisionModel::Floating),
        (1e-6..1e9f64).prop_map(|scale| PrecisionModel::Fixed { scale }),
    ]
}

proptest! {
    #[test]
    fn precision_model_text_round_trips(model in precision_model()) {
        prop_assert_eq!(parse_precision_model(&model.to_string()).unwrap(), model);
        prop_assert_eq!(parse_precision_model(&model.to_string().to_uppercase()).unwrap(), model);
    }

    #[test]
    fn non_positive_scales_are_rejected(scale in -1e9..=0.0f64) {
        let text = format!("fixed:{}", scale);
        prop_assert!(parse_precision_model(&text).is_err());
    }

    #[test]
    fn snapping_is_idempotent(scale in 1u32..1000, value in -1e6..1e6f64) {
        let model = PrecisionModel::Fixed { scale: scale as f64 };
        let once = model.make_precise(value);
        prop_assert_eq!(model.make_precise(once), once);
        prop_assert!((once - value).abs() <= 0.5 / scale as f64 + 1e-9);
    }

    #[test]
    fn validity_mode_ignores_case(strict in any::<bool>(), upper in any::<bool>()) {
        let (text, mode) = if strict {
            ("strict", ValidityMode::Strict)
        } else {
            ("lenient", ValidityMode::Lenient)
        };
        let text = if upper { text.to_uppercase() } else { text.to_string() };
        prop_assert_eq!(parse_validity_mode(&text).unwrap(), mode);
    }
}
