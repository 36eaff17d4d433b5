use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::{QueryParams, QuerySubject};

/// Session attributes exactly as they travel over the wire.
///
/// The client hands these back verbatim on the next turn. Keys the skill does
/// not know about are kept in `extra` and echoed back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAttributes {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub query_subject: Option<QuerySubject>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub query_params: Option<QueryParams>,
    #[serde(
        default,
        deserialize_with = "lenient_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_query: Option<AttemptedQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The most recent query, kept even when it produced nothing to browse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptedQuery {
    pub subject: QuerySubject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<QueryParams>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Browse {
    pub subject: QuerySubject,
    pub params: Option<QueryParams>,
    pub start_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Browsing(Browse),
}

impl SessionAttributes {
    /// Browsing requires both a subject and a start index; anything else is idle.
    pub fn state(&self) -> SessionState {
        match (self.query_subject, self.start_index) {
            (Some(subject), Some(start_index)) => SessionState::Browsing(Browse {
                subject,
                params: self.query_params.clone(),
                start_index: usize::try_from(start_index).unwrap_or(0),
            }),
            _ => SessionState::Idle,
        }
    }

    pub fn set_browsing(&mut self, browse: &Browse) {
        self.query_subject = Some(browse.subject);
        self.query_params = browse.params.clone();
        self.start_index = Some(i64::try_from(browse.start_index).unwrap_or(i64::MAX));
        self.last_query = Some(AttemptedQuery {
            subject: browse.subject,
            params: browse.params.clone(),
        });
    }

    pub fn clear_browsing(&mut self) {
        self.query_subject = None;
        self.query_params = None;
        self.start_index = None;
    }

    pub fn record_attempt(&mut self, subject: QuerySubject, params: Option<QueryParams>) {
        self.last_query = Some(AttemptedQuery { subject, params });
    }

    pub fn apply(&mut self, state: &SessionState) {
        match state {
            SessionState::Idle => self.clear_browsing(),
            SessionState::Browsing(browse) => self.set_browsing(browse),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

fn lenient_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
        Some(Value::String(raw)) => raw.trim().parse::<i64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_without_index_is_idle() {
        let attrs = SessionAttributes {
            query_subject: Some(QuerySubject::Categories),
            ..SessionAttributes::default()
        };
        assert_eq!(attrs.state(), SessionState::Idle);
    }

    #[test]
    fn negative_index_reads_as_zero() {
        let attrs: SessionAttributes =
            serde_json::from_value(serde_json::json!({ "querySubject": "categories", "startIndex": -4 }))
                .expect("attrs");
        let SessionState::Browsing(browse) = attrs.state() else {
            panic!("expected browsing state");
        };
        assert_eq!(browse.start_index, 0);
    }

    #[test]
    fn tolerates_string_index_and_unknown_subject() {
        let attrs: SessionAttributes = serde_json::from_value(serde_json::json!({
            "querySubject": "widgets",
            "startIndex": "10",
        }))
        .expect("attrs");
        assert_eq!(attrs.query_subject, None);
        assert_eq!(attrs.start_index, Some(10));
        assert_eq!(attrs.state(), SessionState::Idle);
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let raw = serde_json::json!({
            "querySubject": "manufacturers",
            "queryParams": { "category": "Appliances" },
            "startIndex": 5,
            "clientCursor": { "page": 2 },
        });
        let attrs: SessionAttributes = serde_json::from_value(raw).expect("attrs");
        assert_eq!(attrs.extra.get("clientCursor"), Some(&serde_json::json!({ "page": 2 })));

        let back = serde_json::to_value(&attrs).expect("json");
        assert_eq!(back["clientCursor"]["page"], 2);
        assert_eq!(back["queryParams"]["category"], "Appliances");
        assert_eq!(back["startIndex"], 5);
    }

    #[test]
    fn clearing_browsing_keeps_the_last_query() {
        let mut attrs = SessionAttributes::default();
        attrs.set_browsing(&Browse {
            subject: QuerySubject::Products,
            params: Some(QueryParams::for_manufacturer("Kenmore")),
            start_index: 3,
        });
        attrs.clear_browsing();

        assert_eq!(attrs.state(), SessionState::Idle);
        assert_eq!(attrs.query_params, None);
        let last = attrs.last_query.expect("last query");
        assert_eq!(last.subject, QuerySubject::Products);
    }

    #[test]
    fn applying_a_state_rewrites_the_browsing_fields() {
        let browse = Browse {
            subject: QuerySubject::Manufacturers,
            params: Some(QueryParams::for_category("Flooring")),
            start_index: 5,
        };
        let mut attrs = SessionAttributes::default();
        attrs.apply(&SessionState::Browsing(browse.clone()));
        assert_eq!(attrs.state(), SessionState::Browsing(browse));

        attrs.apply(&SessionState::Idle);
        assert_eq!(attrs.state(), SessionState::Idle);
        assert_eq!(attrs.start_index, None);
        assert_eq!(
            attrs.last_query.map(|last| last.subject),
            Some(QuerySubject::Manufacturers)
        );
    }
}
