use std::collections::BTreeMap;

use serde_json::Value;

/// Normalized group aggregate for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionAverage {
    pub question_id: String,
    pub title: String,
    pub average: f64,
    pub respondents: u32,
    pub distribution: BTreeMap<String, u32>,
}

/// Normalized averaging result for one wine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WineAverages {
    pub questions: Vec<QuestionAverage>,
    /// Explanation shown when the call succeeded but produced no entries.
    pub note: Option<String>,
}

impl WineAverages {
    #[must_use]
    pub fn empty(note: Option<String>) -> Self {
        Self {
            questions: Vec::new(),
            note,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Terminal result of the processing step, always displayable.
///
/// `Failed` is carried forward as data; the participant is never stuck on
/// a loading or error screen without a continue action.
#[derive(Debug, Clone, PartialEq)]
pub enum AveragesOutcome {
    Ready(WineAverages),
    Failed,
}

/// Normalize the shape-variable averaging payload.
///
/// The backend has shipped the aggregate under `questions`, `data` or
/// `averages` maps, and as a `results` array; all four are accepted and
/// collapsed into one canonical list. A successful call that yields no
/// entries becomes an explanatory empty state rather than an error.
#[must_use]
pub fn normalize(raw: &Value) -> WineAverages {
    for key in ["questions", "data", "averages"] {
        if let Some(map) = raw.get(key).and_then(Value::as_object) {
            if !map.is_empty() {
                let questions: Vec<QuestionAverage> = map
                    .iter()
                    .filter_map(|(id, entry)| normalize_entry(id, entry))
                    .collect();
                if !questions.is_empty() {
                    return WineAverages {
                        questions,
                        note: None,
                    };
                }
            }
        }
    }

    if let Some(results) = raw.get("results").and_then(Value::as_array) {
        let questions: Vec<QuestionAverage> = results
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| normalize_result_entry(index, entry))
            .collect();
        if !questions.is_empty() {
            return WineAverages {
                questions,
                note: None,
            };
        }
        return WineAverages::empty(Some(
            "No scale questions were averaged for this wine".into(),
        ));
    }

    WineAverages::empty(Some("No structured averages were returned".into()))
}

fn normalize_entry(id: &str, entry: &Value) -> Option<QuestionAverage> {
    let average = first_number(entry, &["average", "avg", "value", "averageScore"])?;
    let title = first_string(entry, &["questionTitle", "title", "question"])
        .unwrap_or_else(|| id.to_string());
    let respondents = first_number(
        entry,
        &[
            "participantCount",
            "participants",
            "count",
            "responseCount",
            "totalResponses",
        ],
    )
    .map_or(0, |n| n.round().max(0.0) as u32);

    Some(QuestionAverage {
        question_id: id.to_string(),
        title,
        average,
        respondents,
        distribution: distribution_of(entry),
    })
}

fn normalize_result_entry(index: usize, entry: &Value) -> Option<QuestionAverage> {
    if entry.get("questionType").and_then(Value::as_str) != Some("scale") {
        return None;
    }
    let average = entry.get("averageScore").and_then(Value::as_f64)?;
    let id = first_string(entry, &["slideId", "id"])
        .unwrap_or_else(|| format!("question-{index}"));
    let title = first_string(entry, &["questionTitle", "title"]).unwrap_or_else(|| id.clone());
    let respondents = first_number(entry, &["totalResponses", "responseCount"])
        .map_or(0, |n| n.round().max(0.0) as u32);

    Some(QuestionAverage {
        question_id: id,
        title,
        average,
        respondents,
        distribution: distribution_of(entry),
    })
}

fn distribution_of(entry: &Value) -> BTreeMap<String, u32> {
    entry
        .get("responseDistribution")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| {
                    v.as_f64()
                        .map(|n| (k.clone(), n.round().max(0.0) as u32))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn first_number(entry: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| entry.get(k).and_then(Value::as_f64))
}

fn first_string(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| entry.get(k).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn questions_map_is_primary() {
        let raw = json!({
            "questions": {
                "q1": { "questionTitle": "Body", "average": 7.2, "participantCount": 4 }
            }
        });
        let normalized = normalize(&raw);
        assert_eq!(normalized.questions.len(), 1);
        let q = &normalized.questions[0];
        assert_eq!(q.question_id, "q1");
        assert_eq!(q.title, "Body");
        assert!((q.average - 7.2).abs() < f64::EPSILON);
        assert_eq!(q.respondents, 4);
        assert!(normalized.note.is_none());
    }

    #[test]
    fn data_and_averages_maps_are_accepted() {
        for key in ["data", "averages"] {
            let raw = json!({
                key: { "q9": { "title": "Acidity", "avg": 5.0, "count": 2 } }
            });
            let normalized = normalize(&raw);
            assert_eq!(normalized.questions.len(), 1, "shape {key}");
            assert_eq!(normalized.questions[0].title, "Acidity");
        }
    }

    #[test]
    fn results_array_filters_to_scale_questions() {
        let raw = json!({
            "results": [
                {
                    "questionType": "scale",
                    "slideId": "s1",
                    "questionTitle": "Tannin",
                    "averageScore": 6.4,
                    "totalResponses": 3,
                    "responseDistribution": { "6": 2, "7": 1 }
                },
                { "questionType": "text", "slideId": "s2" }
            ]
        });
        let normalized = normalize(&raw);
        assert_eq!(normalized.questions.len(), 1);
        let q = &normalized.questions[0];
        assert_eq!(q.question_id, "s1");
        assert_eq!(q.respondents, 3);
        assert_eq!(q.distribution.get("6"), Some(&2));
    }

    #[test]
    fn results_without_scales_is_an_explained_empty_state() {
        let raw = json!({ "results": [ { "questionType": "text" } ] });
        let normalized = normalize(&raw);
        assert!(normalized.is_empty());
        assert!(normalized.note.is_some());
    }

    #[test]
    fn unrecognized_payload_is_an_explained_empty_state() {
        let normalized = normalize(&json!({ "unexpected": true }));
        assert!(normalized.is_empty());
        assert!(normalized.note.is_some());
    }

    #[test]
    fn entries_without_an_average_are_skipped() {
        let raw = json!({
            "questions": {
                "q1": { "title": "No number here" },
                "q2": { "title": "Finish", "value": 8.0 }
            }
        });
        let normalized = normalize(&raw);
        assert_eq!(normalized.questions.len(), 1);
        assert_eq!(normalized.questions[0].title, "Finish");
    }
}
