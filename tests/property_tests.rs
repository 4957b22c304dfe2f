/// Property-based tests using proptest
/// Tests invariants of the spend transform and webhook field extraction
use chrono::NaiveDate;
use payt_meta_sync::meta_ads_models::transform_insights;
use payt_meta_sync::webhook_models::{SaleTransactionRecord, WebhookPayload};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn arb_numeric_field() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        "\\PC*".prop_map(|s| Some(Value::String(s))),
        any::<i64>().prop_map(|n| Some(json!(n))),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(|f| Some(json!(f))),
        Just(Some(Value::Null)),
    ]
}

fn arb_insight() -> impl Strategy<Value = Value> {
    (
        proptest::option::of("[0-9]{1,15}"),
        arb_numeric_field(),
        arb_numeric_field(),
        arb_numeric_field(),
    )
        .prop_map(|(campaign_id, spend, impressions, clicks)| {
            let mut obj = Map::new();
            if let Some(id) = campaign_id {
                obj.insert("campaign_id".to_string(), json!(id));
            }
            for (key, value) in [("spend", spend), ("impressions", impressions), ("clicks", clicks)] {
                if let Some(v) = value {
                    obj.insert(key.to_string(), v);
                }
            }
            Value::Object(obj)
        })
}

// Property: the transform is total and length-preserving
proptest! {
    #[test]
    fn transform_yields_one_record_per_input(
        rows in proptest::collection::vec(arb_insight(), 0..50),
        day in 1u32..=28
    ) {
        let run_date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        let records = transform_insights(&rows, run_date);

        prop_assert_eq!(records.len(), rows.len());
        for record in &records {
            prop_assert_eq!(record.date, run_date);
            prop_assert!(record.impressions >= 0);
            prop_assert!(record.clicks >= 0);
            prop_assert!(record.spend >= bigdecimal::BigDecimal::from(0));
        }
    }
}

// Property: parsing arbitrary bodies never panics
proptest! {
    #[test]
    fn payload_parse_never_panics(body in proptest::collection::vec(any::<u8>(), 0..512), json_ct in any::<bool>()) {
        let content_type = if json_ct { Some("application/json") } else { None };
        let _ = WebhookPayload::parse(content_type, &body);
    }

    #[test]
    fn form_payload_preserves_utms(
        source in "[a-z]{1,12}",
        medium in "[a-z]{1,12}",
        id in "[A-Za-z0-9]{1,20}"
    ) {
        let body = format!("id={}&utm_source={}&utm_medium={}", id, source, medium);
        let payload = WebhookPayload::parse(Some("application/x-www-form-urlencoded"), body.as_bytes()).unwrap();
        let record = SaleTransactionRecord::from_payload(&payload, chrono::Utc::now()).unwrap();

        prop_assert_eq!(record.transaction_id, Some(id));
        prop_assert_eq!(record.utm_source, source);
        prop_assert_eq!(record.utm_medium, medium);
        prop_assert_eq!(record.utm_campaign, "");
        prop_assert_eq!(record.utm_content, "");
        prop_assert_eq!(record.utm_term, "");
    }

    #[test]
    fn numeric_amounts_always_accepted(cents in 0u64..10_000_000) {
        let amount = format!("{}.{:02}", cents / 100, cents % 100);
        let payload = WebhookPayload::parse(
            Some("application/json"),
            json!({"transaction_id": "t", "amount": amount}).to_string().as_bytes(),
        )
        .unwrap();

        prop_assert!(payload.amount().is_ok());
    }

    #[test]
    fn alphabetic_amounts_always_rejected(word in "[a-zA-Z]{1,10}") {
        let payload = WebhookPayload::parse(
            Some("application/json"),
            json!({"amount": word}).to_string().as_bytes(),
        )
        .unwrap();

        prop_assert!(payload.amount().is_err());
    }
}
