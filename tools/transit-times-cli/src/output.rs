use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use transit_times::{HourlyDuration, TransitTimeTable};

/// Build the JSON document handed to the charting layer
pub fn table_to_json(table: &TransitTimeTable, profile: Option<&[HourlyDuration]>) -> Result<Value> {
    let mut document = serde_json::Map::new();
    document.insert("title".to_string(), serde_json::json!(table.title()));
    document.insert(
        "table".to_string(),
        serde_json::to_value(table).context("Failed to serialize table")?,
    );

    if let Some(profile) = profile {
        document.insert(
            "profile".to_string(),
            serde_json::to_value(profile).context("Failed to serialize profile")?,
        );
    }

    Ok(Value::Object(document))
}

/// Write the document to `path`, or to stdout when no path is given
pub fn write_json(document: &Value, path: Option<&Path>) -> Result<()> {
    let json_string =
        serde_json::to_string_pretty(document).context("Failed to serialize output")?;

    match path {
        Some(path) => std::fs::write(path, json_string + "\n")
            .with_context(|| format!("Failed to write output to {}", path.display()))?,
        None => println!("{json_string}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use transit_times::{HourBucket, TransitTimeQuery, WeekdayDuration};

    fn table() -> TransitTimeTable {
        let query = TransitTimeQuery::new("8000-10", "s1", "s2", "08:00").unwrap();
        TransitTimeTable {
            route_id: query.route_id,
            first_stop: query.first_stop,
            second_stop: query.second_stop,
            first_stop_name: Some("Praça da Sé".to_string()),
            second_stop_name: None,
            hour: query.hour,
            rows: vec![WeekdayDuration {
                weekday: Weekday::Sun,
                mean_duration_minutes: 3.5,
                samples: 2,
            }],
        }
    }

    #[test]
    fn test_table_document() {
        let document = table_to_json(&table(), None).unwrap();

        assert_eq!(document["title"], "Time it takes from Praça da Sé and s2");
        assert_eq!(document["table"]["hour"], "08:00");
        assert_eq!(document["table"]["route_id"], "8000-10");
        assert_eq!(document["table"]["rows"][0]["weekday"], "Sunday");
        assert_eq!(document["table"]["rows"][0]["mean_duration_minutes"], 3.5);
        assert!(document.get("profile").is_none());
    }

    #[test]
    fn test_profile_document() {
        let profile = vec![HourlyDuration {
            hour: HourBucket::new(7).unwrap(),
            weekday: Weekday::Fri,
            mean_duration_minutes: 2.0,
            samples: 1,
        }];
        let document = table_to_json(&table(), Some(&profile)).unwrap();
        assert_eq!(document["profile"][0]["hour"], "07:00");
        assert_eq!(document["profile"][0]["weekday"], "Friday");
    }
}
