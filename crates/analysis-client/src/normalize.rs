//! Turns an analysis result document into display sections.
//!
//! Sections are described by the `SECTIONS` table rather than per-section
//! code: each entry names the document keys it can be found under and the
//! sub-fields rendered into its body, in order.

use crate::error::{AnalysisClientError, AnalysisResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Number,
    /// Array rendered as a bulleted list.
    List,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    /// `None` renders the value as a bare paragraph.
    pub label: Option<&'static str>,
    pub format: FieldFormat,
}

const fn number(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label: Some(label),
        format: FieldFormat::Number,
    }
}

const fn list(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label: Some(label),
        format: FieldFormat::List,
    }
}

const fn text(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label: Some(label),
        format: FieldFormat::Text,
    }
}

const SUMMARY: FieldSpec = FieldSpec {
    key: "Summary",
    label: None,
    format: FieldFormat::Text,
};

#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub title: &'static str,
    /// Document keys, first present wins.
    pub keys: &'static [&'static str],
    pub fields: &'static [FieldSpec],
    /// Sub-objects also searched for `fields` (e.g. `DynamicLevels`).
    pub nested: &'static [&'static str],
}

pub const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        title: "Market Snapshot",
        keys: &["MarketSnapshot", "marketSnapshot"],
        fields: &[
            number("CurrentPrice", "Current Price"),
            text("Change", "Change"),
            text("DayRange", "Day Range"),
            number("Volume", "Volume"),
            text("FiftyTwoWeekRange", "52-Week Range"),
            text("MarketCap", "Market Cap"),
            SUMMARY,
        ],
        nested: &[],
    },
    SectionSpec {
        title: "Fundamentals & Events",
        keys: &["FundamentalsAndEvents", "Fundamentals", "fundamentals"],
        fields: &[
            number("PERatio", "P/E Ratio"),
            number("EPS", "EPS"),
            text("Revenue", "Revenue"),
            list("RecentEvents", "Recent Events"),
            list("UpcomingEvents", "Upcoming Events"),
            SUMMARY,
        ],
        nested: &[],
    },
    SectionSpec {
        title: "Technical Chart Interpretation",
        keys: &["TechnicalChartInterpretation", "technicalChart"],
        fields: &[
            text("Trend", "Trend"),
            list("SupportLevels", "Support Levels"),
            list("ResistanceLevels", "Resistance Levels"),
            list("Indicators", "Indicators"),
            SUMMARY,
        ],
        nested: &[],
    },
    SectionSpec {
        title: "Price Action",
        keys: &["PriceActionAnalysis", "PriceAction", "priceAction"],
        fields: &[
            text("RecentMove", "Recent Move"),
            list("Patterns", "Patterns"),
            text("VolumeTrend", "Volume Trend"),
            SUMMARY,
        ],
        nested: &[],
    },
    SectionSpec {
        title: "Strategy & Risk",
        keys: &[
            "StrategyAndRiskAssessment",
            "StrategyAndRisk",
            "strategyAndRisk",
        ],
        fields: &[
            text("Stance", "Stance"),
            text("EntryZone", "Entry Zone"),
            text("ProfitTarget", "Profit Target"),
            text("StopLoss", "Stop Loss"),
            text("ExitZone", "Exit Zone"),
            list("Risks", "Risks"),
            SUMMARY,
        ],
        nested: &["DynamicLevels"],
    },
    SectionSpec {
        title: "News Analysis",
        keys: &["NewsAnalysis", "newsAnalysis"],
        fields: &[
            text("Sentiment", "Sentiment"),
            list("Headlines", "Headlines"),
            text("Impact", "Impact"),
            SUMMARY,
        ],
        nested: &[],
    },
    SectionSpec {
        title: "Dynamic Trading Levels",
        keys: &["DynamicLevels", "dynamicLevels"],
        fields: &[
            text("StopLoss", "Stop Loss"),
            text("ProfitTarget", "Profit Target"),
            text("EntryZone", "Entry Zone"),
            text("ExitZone", "Exit Zone"),
        ],
        nested: &[],
    },
];

pub const FINAL_COMMENTARY: SectionSpec = SectionSpec {
    title: "Final Commentary",
    keys: &[
        "FinalCommentary",
        "Final Commentary",
        "UserQuestionResponse",
        "userQuestionResponse",
    ],
    fields: &[
        text("Question", "Question"),
        text("Answer", "Answer"),
        SUMMARY,
    ],
    nested: &[],
};

const OVERVIEW_KEYS: &[&str] = &["overview", "Overview"];
const TICKER_KEYS: &[&str] = &["ticker", "Ticker", "symbol"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalysisSection {
    pub title: String,
    pub body: String,
}

/// Normalized analysis, ready for display or download.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub ticker: Option<String>,
    pub overview: Option<String>,
    /// Present sections only, always in `SECTIONS` order.
    pub sections: Vec<AnalysisSection>,
    pub final_commentary: Option<AnalysisSection>,
}

impl AnalysisReport {
    /// Unwrap a raw job result and normalize it.
    pub fn from_result(raw: &Value, ticker: Option<&str>) -> AnalysisResult<Self> {
        let document = unwrap_document(raw)?;
        let mut report = normalize(&document);
        if report.ticker.is_none() {
            report.ticker = ticker.map(|t| t.trim().to_uppercase());
        }
        Ok(report)
    }

    pub fn is_empty(&self) -> bool {
        self.overview.is_none() && self.sections.is_empty() && self.final_commentary.is_none()
    }

    /// Plain-text report: each block is title, dashed underline, body, blank line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(ticker) = &self.ticker {
            let heading = format!("{} Stock Analysis", ticker);
            out.push_str(&format!("{}\n{}\n\n", heading, "=".repeat(heading.len())));
        }

        let overview = self.overview.as_deref().map(|o| ("Overview", o));
        let blocks = overview
            .into_iter()
            .chain(self.sections.iter().map(|s| (s.title.as_str(), s.body.as_str())))
            .chain(
                self.final_commentary
                    .iter()
                    .map(|s| (s.title.as_str(), s.body.as_str())),
            );

        for (title, body) in blocks {
            out.push_str(title);
            out.push('\n');
            out.push_str(&"-".repeat(title.chars().count()));
            out.push('\n');
            out.push_str(body);
            out.push_str("\n\n");
        }
        out
    }
}

/// Peel transport wrappers off a job result until the analysis object remains.
///
/// Accepts a JSON string (optionally inside a Markdown code fence), an array
/// (first element), `{output}` and `{data}` envelopes.
pub fn unwrap_document(raw: &Value) -> AnalysisResult<Map<String, Value>> {
    const MAX_DEPTH: usize = 8;

    let mut current = raw.clone();
    for _ in 0..MAX_DEPTH {
        current = match current {
            Value::String(s) => serde_json::from_str(strip_code_fence(&s))
                .map_err(|e| AnalysisClientError::InvalidResult(e.to_string()))?,
            Value::Array(mut items) => {
                if items.is_empty() {
                    return Err(AnalysisClientError::InvalidResult(
                        "empty result array".to_string(),
                    ));
                }
                items.swap_remove(0)
            }
            Value::Object(mut map) => {
                if let Some(output) = map.remove("output") {
                    output
                } else if matches!(map.get("data"), Some(Value::Object(_))) {
                    map.remove("data").unwrap_or(Value::Null)
                } else {
                    return Ok(map);
                }
            }
            other => {
                return Err(AnalysisClientError::InvalidResult(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };
    }

    Err(AnalysisClientError::InvalidResult(
        "result is nested too deeply".to_string(),
    ))
}

fn strip_code_fence(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json)
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().trim_end_matches("```").trim()
}

/// Build the report from an already unwrapped document.
pub fn normalize(document: &Map<String, Value>) -> AnalysisReport {
    let sections = SECTIONS
        .iter()
        .filter_map(|spec| render_section(spec, document))
        .collect();

    AnalysisReport {
        ticker: first_present(document, TICKER_KEYS)
            .and_then(Value::as_str)
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty()),
        overview: first_present(document, OVERVIEW_KEYS)
            .map(render_value)
            .filter(|o| !o.is_empty()),
        sections,
        final_commentary: render_section(&FINAL_COMMENTARY, document),
    }
}

fn first_present<'a>(document: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| document.get(*k))
        .find(|v| !v.is_null())
}

fn render_section(spec: &SectionSpec, document: &Map<String, Value>) -> Option<AnalysisSection> {
    let value = first_present(document, spec.keys)?;
    let body = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(fields) => {
            let parts: Vec<String> = spec
                .fields
                .iter()
                .filter_map(|field| {
                    let v = lookup(fields, spec.nested, field.key)?;
                    render_field(field, v)
                })
                .collect();
            if parts.is_empty() {
                pretty(value)
            } else {
                parts.join("\n\n")
            }
        }
        other => pretty(other),
    };

    if body.is_empty() {
        return None;
    }
    Some(AnalysisSection {
        title: spec.title.to_string(),
        body,
    })
}

fn lookup<'a>(fields: &'a Map<String, Value>, nested: &[&str], key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null()).or_else(|| {
        nested
            .iter()
            .filter_map(|n| fields.get(*n)?.get(key))
            .find(|v| !v.is_null())
    })
}

fn render_field(field: &FieldSpec, value: &Value) -> Option<String> {
    let rendered = match field.format {
        FieldFormat::Number => match value {
            Value::Number(n) => format_number(n.as_f64()?),
            other => render_value(other),
        },
        FieldFormat::List => match value {
            Value::Array(items) => items
                .iter()
                .map(render_value)
                .filter(|item| !item.is_empty())
                .map(|item| format!("- {}", item))
                .collect::<Vec<_>>()
                .join("\n"),
            other => render_value(other),
        },
        FieldFormat::Text => render_value(value),
    };

    if rendered.is_empty() {
        return None;
    }
    Some(match (field.label, field.format) {
        (None, _) => rendered,
        (Some(label), FieldFormat::List) if value.is_array() => format!("{}:\n{}", label, rendered),
        (Some(label), _) => format!("{}: {}", label, rendered),
    })
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_overview_only() {
        let report = AnalysisReport::from_result(&json!("{\"overview\":\"x\"}"), None).unwrap();
        assert_eq!(report.overview.as_deref(), Some("x"));
        assert!(report.sections.is_empty());
        assert!(report.final_commentary.is_none());
        assert!(report.ticker.is_none());
    }

    #[test]
    fn test_section_order_is_fixed() {
        let report = normalize(&doc(json!({
            "NewsAnalysis": "Positive coverage",
            "MarketSnapshot": {"CurrentPrice": 2525.5, "Volume": 1200000.0},
            "PriceAction": "Higher highs",
        })));

        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Market Snapshot", "Price Action", "News Analysis"]);
        assert_eq!(
            report.sections[0].body,
            "Current Price: 2525.5\n\nVolume: 1200000"
        );
    }

    #[test]
    fn test_sub_fields_follow_table_order() {
        let report = normalize(&doc(json!({
            "TechnicalChartInterpretation": {
                "Summary": "Bullish bias above the 50 DMA.",
                "SupportLevels": [2450, "2400"],
                "Trend": "Uptrend",
                "Unknown": "ignored"
            }
        })));

        assert_eq!(
            report.sections[0].body,
            "Trend: Uptrend\n\nSupport Levels:\n- 2450\n- 2400\n\nBullish bias above the 50 DMA."
        );
    }

    #[test]
    fn test_strategy_reads_dynamic_levels() {
        let report = normalize(&doc(json!({
            "StrategyAndRiskAssessment": {
                "Stance": "Accumulate",
                "DynamicLevels": {"StopLoss": "2380", "ProfitTarget": "2700"}
            }
        })));

        assert_eq!(
            report.sections[0].body,
            "Stance: Accumulate\n\nProfit Target: 2700\n\nStop Loss: 2380"
        );
    }

    #[test]
    fn test_top_level_dynamic_levels_get_their_own_section() {
        let report = normalize(&doc(json!({
            "StrategyAndRiskAssessment": "Hold with a trailing stop.",
            "DynamicLevels": {
                "EntryZone": "2450-2470",
                "StopLoss": "2380",
                "ProfitTarget": "2700"
            }
        })));

        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Strategy & Risk", "Dynamic Trading Levels"]);
        assert_eq!(report.sections[0].body, "Hold with a trailing stop.");
        assert_eq!(
            report.sections[1].body,
            "Stop Loss: 2380\n\nProfit Target: 2700\n\nEntry Zone: 2450-2470"
        );
    }

    #[test]
    fn test_dynamic_levels_without_strategy_section() {
        let report = normalize(&doc(json!({
            "DynamicLevels": {"ExitZone": "2750"}
        })));

        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].title, "Dynamic Trading Levels");
        assert_eq!(report.sections[0].body, "Exit Zone: 2750");
    }

    #[test]
    fn test_unknown_shape_falls_back_to_dump() {
        let report = normalize(&doc(json!({
            "NewsAnalysis": {"foo": 1},
            "PriceAction": [1, 2]
        })));

        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[0].title, "Price Action");
        assert!(report.sections[1].body.contains("\"foo\": 1"));
    }

    #[test]
    fn test_blank_sections_are_omitted() {
        let report = normalize(&doc(json!({
            "MarketSnapshot": "   ",
            "NewsAnalysis": null
        })));
        assert!(report.is_empty());
    }

    #[test]
    fn test_final_commentary() {
        let report = normalize(&doc(json!({
            "Final Commentary": {
                "Question": "Should I buy?",
                "Answer": "Wait for a pullback."
            }
        })));

        let commentary = report.final_commentary.unwrap();
        assert_eq!(commentary.title, "Final Commentary");
        assert_eq!(
            commentary.body,
            "Question: Should I buy?\n\nAnswer: Wait for a pullback."
        );
        assert!(report.sections.is_empty());
    }

    #[test]
    fn test_unwrap_envelopes() {
        let inner = "```json\n{\"overview\":\"wrapped\"}\n```";
        let raw = json!([{ "output": inner }]);
        let document = unwrap_document(&raw).unwrap();
        assert_eq!(document.get("overview"), Some(&json!("wrapped")));

        let raw = json!({ "data": { "overview": "data" } });
        assert_eq!(
            unwrap_document(&raw).unwrap().get("overview"),
            Some(&json!("data"))
        );
    }

    #[test]
    fn test_unparseable_result_is_fatal() {
        assert!(matches!(
            unwrap_document(&json!("not json")),
            Err(AnalysisClientError::InvalidResult(_))
        ));
        assert!(matches!(
            unwrap_document(&json!(42)),
            Err(AnalysisClientError::InvalidResult(_))
        ));
        assert!(matches!(
            unwrap_document(&json!([])),
            Err(AnalysisClientError::InvalidResult(_))
        ));
    }

    #[test]
    fn test_ticker_from_document_wins() {
        let report =
            AnalysisReport::from_result(&json!({"ticker": "infy", "overview": "x"}), Some("TCS"))
                .unwrap();
        assert_eq!(report.ticker.as_deref(), Some("INFY"));

        let report = AnalysisReport::from_result(&json!({"overview": "x"}), Some("tcs")).unwrap();
        assert_eq!(report.ticker.as_deref(), Some("TCS"));
    }

    #[test]
    fn test_text_report() {
        let report = AnalysisReport {
            ticker: Some("INFY".to_string()),
            overview: Some("Solid quarter.".to_string()),
            sections: vec![AnalysisSection {
                title: "Price Action".to_string(),
                body: "Higher highs".to_string(),
            }],
            final_commentary: None,
        };

        assert_eq!(
            report.to_text(),
            "INFY Stock Analysis\n===================\n\n\
             Overview\n--------\nSolid quarter.\n\n\
             Price Action\n------------\nHigher highs\n\n"
        );
    }
}
