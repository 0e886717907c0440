//! Driver assistant with a rule-based fallback.
//!
//! Questions go to the NLP providers through the hybrid layer. In degraded
//! mode, or when every provider is exhausted, a keyword responder answers
//! instead so the driver always gets something useful.

use haulguard_core::{ChatReply, ResponseSource};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

use crate::hybrid::HybridApiService;

/// Instructions sent ahead of every provider prompt.
pub const SYSTEM_PROMPT: &str = "You are a co-pilot for a US commercial truck driver. \
Answer briefly and practically. Follow FMCSA hours-of-service and hazmat rules. \
Never advise driving past a legal limit.";

// ============================================================================
// Context
// ============================================================================

/// What the assistant knows about the driver's situation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantContext {
    /// Driving minutes left before an HOS limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hos_remaining_driving_min: Option<i64>,
    /// Where the truck is, as display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Load description (e.g. "hazmat class 3, 38,000 lb").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<String>,
    /// Active trouble codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_codes: Vec<String>,
}

impl AssistantContext {
    /// Renders the context as prompt text, or `None` if empty.
    pub fn render(&self) -> Option<String> {
        let mut out = String::new();
        if let Some(minutes) = self.hos_remaining_driving_min {
            let _ = writeln!(out, "HOS driving time remaining: {}", format_minutes(minutes));
        }
        if let Some(location) = &self.location {
            let _ = writeln!(out, "Location: {location}");
        }
        if let Some(load) = &self.load {
            let _ = writeln!(out, "Load: {load}");
        }
        if !self.active_codes.is_empty() {
            let _ = writeln!(out, "Active trouble codes: {}", self.active_codes.join(", "));
        }
        (!out.is_empty()).then_some(out)
    }
}

fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

// ============================================================================
// Rule-Based Responder
// ============================================================================

/// Topics the rule-based responder recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Hours of service.
    HoursOfService,
    /// Rest breaks.
    Breaks,
    /// Hazardous materials.
    Hazmat,
    /// Weather and road conditions.
    Weather,
    /// Engine codes and maintenance.
    Maintenance,
    /// Fuel and mileage.
    Fuel,
    /// Parking and rest areas.
    Parking,
    /// Electronic logging devices.
    Eld,
    /// Weigh stations and scales.
    WeighStations,
}

/// Keyword table, checked in order. Breaks come before HOS so
/// "when do I need a break" gets the break answer.
const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (Topic::Breaks, &["break", "30 min", "30-min", "thirty minute"]),
    (Topic::Hazmat, &["hazmat", "hazardous", "placard", "dangerous goods"]),
    (Topic::Eld, &["eld", "logbook", "log book", "electronic log"]),
    (Topic::HoursOfService, &["hours of service", "hos", "11 hour", "14 hour", "drive time", "driving time", "cycle", "34 hour", "how long can i drive"]),
    (Topic::Weather, &["weather", "snow", "ice", "icy", "rain", "wind", "fog", "storm"]),
    (Topic::Maintenance, &["engine", "check engine", "code", "dtc", "maintenance", "oil", "brake", "tire", "dpf", "regen"]),
    (Topic::Fuel, &["fuel", "diesel", "mpg", "def", "gallon"]),
    (Topic::Parking, &["parking", "park", "rest area", "truck stop", "sleep", "overnight"]),
    (Topic::WeighStations, &["weigh", "scale", "prepass", "overweight"]),
];

/// Finds the first topic whose keywords appear in `question`.
pub fn detect_topic(question: &str) -> Option<Topic> {
    let lowered = question.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    TOPIC_KEYWORDS.iter().find_map(|(topic, keywords)| {
        let hit = keywords.iter().any(|keyword| {
            if keyword.contains(' ') || keyword.contains('-') {
                lowered.contains(keyword)
            } else {
                words.contains(keyword)
            }
        });
        hit.then_some(*topic)
    })
}

fn suggestions(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Answers `question` from built-in rules.
pub fn rule_based_answer(question: &str, context: &AssistantContext) -> ChatReply {
    let remaining = context.hos_remaining_driving_min;
    let (text, follow_ups) = match detect_topic(question) {
        Some(Topic::HoursOfService) => {
            let mut text = String::from(
                "Property carriers may drive 11 hours after 10 consecutive hours off duty, \
                 within a 14-hour window. Weekly limits are 60 hours in 7 days or 70 hours \
                 in 8 days; a 34-hour restart resets the cycle.",
            );
            if let Some(minutes) = remaining {
                let _ = write!(text, " You have {} of driving left.", format_minutes(minutes));
                if minutes < 60 {
                    text.push_str(" Start looking for parking now.");
                }
            }
            (text, suggestions(&["When do I need a 30-minute break?", "Where can I park tonight?"]))
        }
        Some(Topic::Breaks) => (
            "A 30-minute break is required after 8 cumulative hours of driving. Any 30 \
             consecutive minutes not driving counts: off duty, sleeper or on duty."
                .to_string(),
            suggestions(&["How many driving hours do I have left?"]),
        ),
        Some(Topic::Hazmat) => (
            "Carry shipping papers within reach, check placards on all four sides and \
             follow posted hazmat routes. Stop at all railroad crossings and never park \
             within 5 feet of the traveled roadway with placarded loads."
                .to_string(),
            suggestions(&["Which tunnels restrict hazmat?", "What placards does my load need?"]),
        ),
        Some(Topic::Weather) => (
            "In bad weather slow down by a third on wet roads and by half or more on snow. \
             Double your following distance and park if chains are required and you are \
             not equipped. High-profile empty trailers are at risk in strong crosswinds."
                .to_string(),
            suggestions(&["What's the weather at my location?"]),
        ),
        Some(Topic::Maintenance) => {
            let mut text = String::from(
                "Run your trouble codes through diagnostics for severity and next steps. \
                 A flashing check engine light, low oil pressure or high coolant temperature \
                 means stop as soon as it is safe.",
            );
            if !context.active_codes.is_empty() {
                let _ = write!(text, " Active codes: {}.", context.active_codes.join(", "));
            }
            (text, suggestions(&["Analyze my trouble codes", "What maintenance is due?"]))
        }
        Some(Topic::Fuel) => (
            "Keep speed near 62-65 mph, limit idling and keep tires at rated pressure to \
             save fuel. Keep DEF above a quarter tank to avoid derate."
                .to_string(),
            suggestions(&["Where is the next truck stop?"]),
        ),
        Some(Topic::Parking) => {
            let mut text = String::from(
                "Truck parking fills up by early evening. Plan your stop an hour ahead and \
                 keep a backup: rest areas, truck stops and shipper lots where allowed.",
            );
            if let Some(minutes) = remaining {
                let _ = write!(text, " With {} left, plan to be parked by then.", format_minutes(minutes));
            }
            (text, suggestions(&["How many driving hours do I have left?"]))
        }
        Some(Topic::Eld) => (
            "Your ELD records driving automatically above 5 mph. Annotate edits, certify \
             each day's log and carry the ELD instruction sheet and 8 days of blank paper \
             logs in case of malfunction."
                .to_string(),
            suggestions(&["What do I do if my ELD malfunctions?"]),
        ),
        Some(Topic::WeighStations) => (
            "Pull in when the scale is open unless your bypass transponder shows green. \
             Keep axle weights at or under 12,000 lb steer, 34,000 lb tandem and 80,000 lb \
             gross unless permitted."
                .to_string(),
            suggestions(&["Is my load within axle limits?"]),
        ),
        None => {
            let mut text = String::from(
                "I can help with hours of service, breaks, hazmat, weather, maintenance, \
                 fuel, parking, ELD and weigh stations.",
            );
            if let Some(minutes) = remaining {
                let _ = write!(text, " You have {} of driving left.", format_minutes(minutes));
            }
            (text, suggestions(&["How many hours can I drive?", "What's the weather ahead?"]))
        }
    };

    ChatReply {
        text,
        source: ResponseSource::RuleBased,
        suggestions: follow_ups,
    }
}

// ============================================================================
// Assistant
// ============================================================================

/// Driver assistant over the hybrid layer.
#[derive(Debug, Clone)]
pub struct AiAssistant {
    hybrid: Arc<HybridApiService>,
}

impl AiAssistant {
    /// Creates the assistant.
    pub fn new(hybrid: Arc<HybridApiService>) -> Self {
        Self { hybrid }
    }

    /// Answers a driver question.
    ///
    /// Never fails: degraded mode or provider exhaustion produce a
    /// rule-based reply.
    pub async fn ask(&self, question: &str, context: &AssistantContext) -> ChatReply {
        let question = question.trim();
        if self.hybrid.is_degraded_mode().await {
            info!("Degraded mode, answering from rules");
            return rule_based_answer(question, context);
        }

        let mut prompt_context = String::from(SYSTEM_PROMPT);
        if let Some(rendered) = context.render() {
            prompt_context.push('\n');
            prompt_context.push_str(&rendered);
        }

        match self.hybrid.complete_chat(question, Some(&prompt_context)).await {
            Some(reply) => reply,
            None => {
                debug!("NLP providers exhausted, answering from rules");
                rule_based_answer(question, context)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_topic() {
        assert_eq!(detect_topic("How long can I drive today?"), Some(Topic::HoursOfService));
        assert_eq!(detect_topic("When do I need a break?"), Some(Topic::Breaks));
        assert_eq!(detect_topic("hazmat routes near Denver"), Some(Topic::Hazmat));
        assert_eq!(detect_topic("Is the road icy?"), Some(Topic::Weather));
        assert_eq!(detect_topic("check engine light is on"), Some(Topic::Maintenance));
        assert_eq!(detect_topic("cheapest diesel nearby"), Some(Topic::Fuel));
        assert_eq!(detect_topic("where can I park tonight"), Some(Topic::Parking));
        assert_eq!(detect_topic("my ELD shows an error"), Some(Topic::Eld));
        assert_eq!(detect_topic("is the weigh station open"), Some(Topic::WeighStations));
        assert_eq!(detect_topic("tell me a joke"), None);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        // "shows" must not match "hos".
        assert_eq!(detect_topic("what shows tonight"), None);
    }

    #[test]
    fn test_hos_answer_uses_remaining_time() {
        let ctx = AssistantContext {
            hos_remaining_driving_min: Some(45),
            ..AssistantContext::default()
        };
        let reply = rule_based_answer("how many HOS hours left", &ctx);
        assert_eq!(reply.source, ResponseSource::RuleBased);
        assert!(reply.text.contains("45 min of driving left"));
        assert!(reply.text.contains("parking"));
        assert!(!reply.suggestions.is_empty());
    }

    #[test]
    fn test_answers_are_deterministic() {
        let ctx = AssistantContext::default();
        assert_eq!(
            rule_based_answer("fuel tips?", &ctx),
            rule_based_answer("fuel tips?", &ctx)
        );
    }

    #[test]
    fn test_generic_answer() {
        let ctx = AssistantContext {
            hos_remaining_driving_min: Some(125),
            ..AssistantContext::default()
        };
        let reply = rule_based_answer("hello", &ctx);
        assert!(reply.text.contains("I can help"));
        assert!(reply.text.contains("2h 5m"));
    }

    #[test]
    fn test_render_context() {
        assert!(AssistantContext::default().render().is_none());
        let ctx = AssistantContext {
            hos_remaining_driving_min: Some(120),
            location: Some("Gary, IN".to_string()),
            load: None,
            active_codes: vec!["P0300".to_string()],
        };
        let rendered = ctx.render().unwrap();
        assert!(rendered.contains("2h"));
        assert!(rendered.contains("Gary, IN"));
        assert!(rendered.contains("P0300"));
    }
}
