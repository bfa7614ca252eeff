//! Trait vector aggregation.
//!
//! Reduces a batch of labeled messages to a fixed-shape [`TraitVector`].
//! Every message is scanned once and each (category, label) pair present in
//! it bumps one counter, regardless of how often the label is repeated.
//!
//! Dominant emotion and communication style are picked by highest count. Ties
//! go to the label that entered the counter first during the scan, which is
//! why the per-message scan order below is part of the contract. Reordering
//! messages never changes ratios but can change those tie-breaks.
//!
//! The attachment style is the first maximum of the attachment ratio table in
//! declared order (secure, anxious, avoidant, fearful, ambivalent), so it does
//! not depend on message order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AggregateError;
use crate::pipeline::types::LabeledMessage;
use crate::taxonomy::{
    AttachmentPattern, CommunicationStyle, EmotionExpression, RelationshipAttitude, SelfAssertion,
    TaxonomyLabel,
};

/// Emotion scan order within one message.
const EMOTION_SCAN: [EmotionExpression; 8] = [
    EmotionExpression::Affection,
    EmotionExpression::Gratitude,
    EmotionExpression::Frustration,
    EmotionExpression::Anxiety,
    EmotionExpression::Jealousy,
    EmotionExpression::Loneliness,
    EmotionExpression::Sadness,
    EmotionExpression::Resentment,
];

/// Communication-style scan order within one message.
const COMMUNICATION_SCAN: [CommunicationStyle; 6] = [
    CommunicationStyle::Explanation,
    CommunicationStyle::Question,
    CommunicationStyle::Silence,
    CommunicationStyle::MetaConversation,
    CommunicationStyle::PassiveAggressive,
    CommunicationStyle::Repetition,
];

const ASSERTION_SCAN: [SelfAssertion; 5] = [
    SelfAssertion::Request,
    SelfAssertion::Complaint,
    SelfAssertion::Expectation,
    SelfAssertion::Boundaries,
    SelfAssertion::Reproach,
];

const ATTITUDE_SCAN: [RelationshipAttitude; 3] = [
    RelationshipAttitude::Accommodating,
    RelationshipAttitude::Withdrawing,
    RelationshipAttitude::Confronting,
];

/// Fixed-shape summary of one message batch. Never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitVector {
    pub user_id: Option<String>,
    pub message_count: usize,

    pub affection_level: f64,
    pub gratitude_level: f64,
    pub frustration_level: f64,
    pub anxiety_level: f64,
    pub jealousy_level: f64,
    pub loneliness_level: f64,
    pub sadness_level: f64,
    pub resentment_level: f64,

    pub request_tendency: f64,
    pub complaint_tendency: f64,
    pub expectation_level: f64,
    pub boundaries_level: f64,
    pub reproach_level: f64,
    pub accommodation_level: f64,
    pub withdrawal_level: f64,
    pub confrontation_level: f64,
    /// Raw number of messages labeled `reconnecting`, not a ratio.
    pub reconnection_attempts: usize,

    pub explanation_ratio: f64,
    pub questioning_rate: f64,
    pub silence_ratio: f64,
    pub meta_conversation_ratio: f64,
    pub passive_aggressive_ratio: f64,
    pub repetition_ratio: f64,

    pub secure_ratio: f64,
    pub anxious_ratio: f64,
    pub avoidant_ratio: f64,
    pub fearful_ratio: f64,
    pub ambivalent_ratio: f64,

    pub attachment_style: AttachmentPattern,
    #[serde(with = "label_or_none")]
    pub dominant_emotion: Option<EmotionExpression>,
    #[serde(with = "label_or_none")]
    pub dominant_communication: Option<CommunicationStyle>,

    pub emotional_stability_score: f64,
    pub expression_openness_score: f64,
}

impl TraitVector {
    /// The eight emotion ratios, in field order.
    pub fn emotion_ratios(&self) -> [(EmotionExpression, f64); 8] {
        [
            (EmotionExpression::Affection, self.affection_level),
            (EmotionExpression::Gratitude, self.gratitude_level),
            (EmotionExpression::Frustration, self.frustration_level),
            (EmotionExpression::Anxiety, self.anxiety_level),
            (EmotionExpression::Jealousy, self.jealousy_level),
            (EmotionExpression::Loneliness, self.loneliness_level),
            (EmotionExpression::Sadness, self.sadness_level),
            (EmotionExpression::Resentment, self.resentment_level),
        ]
    }

    /// Every ratio field by name (excludes counts and composite scores).
    pub fn ratios(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("affection_level", self.affection_level),
            ("gratitude_level", self.gratitude_level),
            ("frustration_level", self.frustration_level),
            ("anxiety_level", self.anxiety_level),
            ("jealousy_level", self.jealousy_level),
            ("loneliness_level", self.loneliness_level),
            ("sadness_level", self.sadness_level),
            ("resentment_level", self.resentment_level),
            ("request_tendency", self.request_tendency),
            ("complaint_tendency", self.complaint_tendency),
            ("expectation_level", self.expectation_level),
            ("boundaries_level", self.boundaries_level),
            ("reproach_level", self.reproach_level),
            ("accommodation_level", self.accommodation_level),
            ("withdrawal_level", self.withdrawal_level),
            ("confrontation_level", self.confrontation_level),
            ("explanation_ratio", self.explanation_ratio),
            ("questioning_rate", self.questioning_rate),
            ("silence_ratio", self.silence_ratio),
            ("meta_conversation_ratio", self.meta_conversation_ratio),
            ("passive_aggressive_ratio", self.passive_aggressive_ratio),
            ("repetition_ratio", self.repetition_ratio),
            ("secure_ratio", self.secure_ratio),
            ("anxious_ratio", self.anxious_ratio),
            ("avoidant_ratio", self.avoidant_ratio),
            ("fearful_ratio", self.fearful_ratio),
            ("ambivalent_ratio", self.ambivalent_ratio),
        ]
    }
}

/// Counter that remembers the order in which labels were first counted.
#[derive(Debug)]
struct Tally<L> {
    entries: Vec<(L, usize)>,
}

impl<L: Copy + Eq> Tally<L> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn bump(&mut self, label: L) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label, 1)),
        }
    }

    fn count(&self, label: L) -> usize {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0, |(_, count)| *count)
    }

    /// Highest count; the earliest inserted label wins a tie.
    fn most_common(&self) -> Option<L> {
        let mut best: Option<(L, usize)> = None;
        for &(label, count) in &self.entries {
            if best.is_none_or(|(_, top)| count > top) {
                best = Some((label, count));
            }
        }
        best.map(|(label, _)| label)
    }
}

/// Reduce a labeled batch to a [`TraitVector`].
///
/// Fails with [`AggregateError::EmptyInput`] when `messages` is empty.
pub fn aggregate(
    user_id: Option<&str>,
    messages: &[LabeledMessage],
) -> Result<TraitVector, AggregateError> {
    let n = messages.len();
    if n == 0 {
        return Err(AggregateError::EmptyInput);
    }

    let mut emotions = Tally::new();
    let mut assertions = Tally::new();
    let mut attitudes = Tally::new();
    let mut communication = Tally::new();
    let mut attachment = Tally::new();
    let mut reconnection_attempts = 0;

    for message in messages {
        let labels = &message.labels;
        bump_present(&mut emotions, labels, &EMOTION_SCAN);
        bump_present(&mut assertions, labels, &ASSERTION_SCAN);
        bump_present(&mut attitudes, labels, &ATTITUDE_SCAN);
        if labels.contains(RelationshipAttitude::Reconnecting) {
            reconnection_attempts += 1;
        }
        bump_present(&mut communication, labels, &COMMUNICATION_SCAN);
        bump_present(&mut attachment, labels, AttachmentPattern::ALL);
    }

    let ratio = |count: usize| count as f64 / n as f64;

    let affection_level = ratio(emotions.count(EmotionExpression::Affection));
    let gratitude_level = ratio(emotions.count(EmotionExpression::Gratitude));
    let frustration_level = ratio(emotions.count(EmotionExpression::Frustration));
    let anxiety_level = ratio(emotions.count(EmotionExpression::Anxiety));
    let jealousy_level = ratio(emotions.count(EmotionExpression::Jealousy));
    let loneliness_level = ratio(emotions.count(EmotionExpression::Loneliness));
    let sadness_level = ratio(emotions.count(EmotionExpression::Sadness));
    let resentment_level = ratio(emotions.count(EmotionExpression::Resentment));

    let request_tendency = ratio(assertions.count(SelfAssertion::Request));
    let explanation_ratio = ratio(communication.count(CommunicationStyle::Explanation));
    let questioning_rate = ratio(communication.count(CommunicationStyle::Question));

    let emotion_values = [
        affection_level,
        gratitude_level,
        frustration_level,
        anxiety_level,
        jealousy_level,
        loneliness_level,
        sadness_level,
        resentment_level,
    ];
    let max = emotion_values.iter().copied().fold(f64::MIN, f64::max);
    let min = emotion_values.iter().copied().fold(f64::MAX, f64::min);
    let emotional_stability_score = 1.0 - (max - min);
    let expression_openness_score =
        (affection_level + request_tendency + explanation_ratio + questioning_rate).min(1.0);

    let vector = TraitVector {
        user_id: user_id.map(str::to_string),
        message_count: n,
        affection_level,
        gratitude_level,
        frustration_level,
        anxiety_level,
        jealousy_level,
        loneliness_level,
        sadness_level,
        resentment_level,
        request_tendency,
        complaint_tendency: ratio(assertions.count(SelfAssertion::Complaint)),
        expectation_level: ratio(assertions.count(SelfAssertion::Expectation)),
        boundaries_level: ratio(assertions.count(SelfAssertion::Boundaries)),
        reproach_level: ratio(assertions.count(SelfAssertion::Reproach)),
        accommodation_level: ratio(attitudes.count(RelationshipAttitude::Accommodating)),
        withdrawal_level: ratio(attitudes.count(RelationshipAttitude::Withdrawing)),
        confrontation_level: ratio(attitudes.count(RelationshipAttitude::Confronting)),
        reconnection_attempts,
        explanation_ratio,
        questioning_rate,
        silence_ratio: ratio(communication.count(CommunicationStyle::Silence)),
        meta_conversation_ratio: ratio(communication.count(CommunicationStyle::MetaConversation)),
        passive_aggressive_ratio: ratio(
            communication.count(CommunicationStyle::PassiveAggressive),
        ),
        repetition_ratio: ratio(communication.count(CommunicationStyle::Repetition)),
        secure_ratio: ratio(attachment.count(AttachmentPattern::Secure)),
        anxious_ratio: ratio(attachment.count(AttachmentPattern::Anxious)),
        avoidant_ratio: ratio(attachment.count(AttachmentPattern::Avoidant)),
        fearful_ratio: ratio(attachment.count(AttachmentPattern::Fearful)),
        ambivalent_ratio: ratio(attachment.count(AttachmentPattern::Ambivalent)),
        attachment_style: first_max(&attachment, AttachmentPattern::ALL)
            .unwrap_or(AttachmentPattern::Secure),
        dominant_emotion: emotions.most_common(),
        dominant_communication: communication.most_common(),
        emotional_stability_score,
        expression_openness_score,
    };

    debug!(
        message_count = n,
        dominant_emotion = vector.dominant_emotion.map_or("none", |e| e.id()),
        attachment_style = vector.attachment_style.id(),
        stability = vector.emotional_stability_score,
        openness = vector.expression_openness_score,
        "Trait vector computed"
    );

    Ok(vector)
}

/// Label with the highest count, earliest in `order` on a tie. An all-zero
/// table resolves to its first entry.
fn first_max<L: Copy + Eq>(tally: &Tally<L>, order: &[L]) -> Option<L> {
    let mut best: Option<(L, usize)> = None;
    for &label in order {
        let count = tally.count(label);
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

fn bump_present<L: TaxonomyLabel>(
    tally: &mut Tally<L>,
    labels: &crate::pipeline::types::Labels,
    scan: &[L],
) {
    for &label in scan {
        if labels.contains(label) {
            tally.bump(label);
        }
    }
}

/// Serializes a missing dominant label as `"none"`.
mod label_or_none {
    use serde::de::IntoDeserializer;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const NONE: &str = "none";

    pub fn serialize<L, S>(value: &Option<L>, serializer: S) -> Result<S::Ok, S::Error>
    where
        L: Serialize,
        S: Serializer,
    {
        match value {
            Some(label) => label.serialize(serializer),
            None => serializer.serialize_str(NONE),
        }
    }

    pub fn deserialize<'de, L, D>(deserializer: D) -> Result<Option<L>, D::Error>
    where
        L: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == NONE {
            return Ok(None);
        }
        L::deserialize(raw.as_str().into_deserializer()).map(Some)
    }
}
