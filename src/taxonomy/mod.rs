//! Closed label taxonomy.
//!
//! Six categories, each with a fixed, ordered list of labels. Identifiers are
//! the stable wire form; display strings are only used for prompting and
//! presentation.

pub mod keywords;

use serde::{Deserialize, Serialize};

/// One of the six classification axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EmotionExpression,
    SelfAssertion,
    RelationshipAttitude,
    CommunicationStyle,
    AttachmentPattern,
    TopicContext,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 6] = [
        Category::EmotionExpression,
        Category::SelfAssertion,
        Category::RelationshipAttitude,
        Category::CommunicationStyle,
        Category::AttachmentPattern,
        Category::TopicContext,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::EmotionExpression => "emotion_expression",
            Self::SelfAssertion => "self_assertion",
            Self::RelationshipAttitude => "relationship_attitude",
            Self::CommunicationStyle => "communication_style",
            Self::AttachmentPattern => "attachment_pattern",
            Self::TopicContext => "topic_context",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            Self::EmotionExpression => "감정 표현",
            Self::SelfAssertion => "자기 주장",
            Self::RelationshipAttitude => "관계 태도",
            Self::CommunicationStyle => "의사소통 방식",
            Self::AttachmentPattern => "애착 패턴",
            Self::TopicContext => "대화 주제",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Label identifiers of this category, in declaration order.
    pub fn label_ids(self) -> Vec<&'static str> {
        match self {
            Self::EmotionExpression => ids::<EmotionExpression>(),
            Self::SelfAssertion => ids::<SelfAssertion>(),
            Self::RelationshipAttitude => ids::<RelationshipAttitude>(),
            Self::CommunicationStyle => ids::<CommunicationStyle>(),
            Self::AttachmentPattern => ids::<AttachmentPattern>(),
            Self::TopicContext => ids::<TopicContext>(),
        }
    }
}

fn ids<L: TaxonomyLabel>() -> Vec<&'static str> {
    L::ALL.iter().map(|l| l.id()).collect()
}

/// A label enum belonging to exactly one category.
pub trait TaxonomyLabel: Copy + Eq + 'static {
    const CATEGORY: Category;
    /// Every label of the category, in declaration order.
    const ALL: &'static [Self];

    fn id(self) -> &'static str;
    fn display(self) -> &'static str;

    fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.id() == id)
    }
}

/// Emotion expressed by the speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionExpression {
    Affection,
    Frustration,
    Anxiety,
    Gratitude,
    Jealousy,
    Resentment,
    Loneliness,
    Sadness,
}

impl TaxonomyLabel for EmotionExpression {
    const CATEGORY: Category = Category::EmotionExpression;
    const ALL: &'static [Self] = &[
        Self::Affection,
        Self::Frustration,
        Self::Anxiety,
        Self::Gratitude,
        Self::Jealousy,
        Self::Resentment,
        Self::Loneliness,
        Self::Sadness,
    ];

    fn id(self) -> &'static str {
        match self {
            Self::Affection => "affection",
            Self::Frustration => "frustration",
            Self::Anxiety => "anxiety",
            Self::Gratitude => "gratitude",
            Self::Jealousy => "jealousy",
            Self::Resentment => "resentment",
            Self::Loneliness => "loneliness",
            Self::Sadness => "sadness",
        }
    }

    fn display(self) -> &'static str {
        match self {
            Self::Affection => "애정",
            Self::Frustration => "짜증/좌절",
            Self::Anxiety => "불안",
            Self::Gratitude => "감사",
            Self::Jealousy => "질투",
            Self::Resentment => "분노/억울함",
            Self::Loneliness => "외로움",
            Self::Sadness => "슬픔",
        }
    }
}

/// How the speaker asserts their own needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfAssertion {
    Request,
    Complaint,
    Boundaries,
    Expectation,
    Reproach,
    Withdrawal,
}

impl TaxonomyLabel for SelfAssertion {
    const CATEGORY: Category = Category::SelfAssertion;
    const ALL: &'static [Self] = &[
        Self::Request,
        Self::Complaint,
        Self::Boundaries,
        Self::Expectation,
        Self::Reproach,
        Self::Withdrawal,
    ];

    fn id(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Complaint => "complaint",
            Self::Boundaries => "boundaries",
            Self::Expectation => "expectation",
            Self::Reproach => "reproach",
            Self::Withdrawal => "withdrawal",
        }
    }

    fn display(self) -> &'static str {
        match self {
            Self::Request => "요청",
            Self::Complaint => "불만 제기",
            Self::Boundaries => "경계 설정",
            Self::Expectation => "기대 표현",
            Self::Reproach => "질책",
            Self::Withdrawal => "거리 두기",
        }
    }
}

/// Stance the speaker takes toward the relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipAttitude {
    Accommodating,
    Withdrawing,
    Confronting,
    Reconnecting,
    Testing,
}

impl TaxonomyLabel for RelationshipAttitude {
    const CATEGORY: Category = Category::RelationshipAttitude;
    const ALL: &'static [Self] = &[
        Self::Accommodating,
        Self::Withdrawing,
        Self::Confronting,
        Self::Reconnecting,
        Self::Testing,
    ];

    fn id(self) -> &'static str {
        match self {
            Self::Accommodating => "accommodating",
            Self::Withdrawing => "withdrawing",
            Self::Confronting => "confronting",
            Self::Reconnecting => "reconnecting",
            Self::Testing => "testing",
        }
    }

    fn display(self) -> &'static str {
        match self {
            Self::Accommodating => "수용",
            Self::Withdrawing => "회피",
            Self::Confronting => "직면",
            Self::Reconnecting => "관계 회복 시도",
            Self::Testing => "떠보기",
        }
    }
}

/// Surface form of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStyle {
    Question,
    Explanation,
    Silence,
    PassiveAggressive,
    Repetition,
    MetaConversation,
}

impl TaxonomyLabel for CommunicationStyle {
    const CATEGORY: Category = Category::CommunicationStyle;
    const ALL: &'static [Self] = &[
        Self::Question,
        Self::Explanation,
        Self::Silence,
        Self::PassiveAggressive,
        Self::Repetition,
        Self::MetaConversation,
    ];

    fn id(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Explanation => "explanation",
            Self::Silence => "silence",
            Self::PassiveAggressive => "passive_aggressive",
            Self::Repetition => "repetition",
            Self::MetaConversation => "meta_conversation",
        }
    }

    fn display(self) -> &'static str {
        match self {
            Self::Question => "질문",
            Self::Explanation => "설명",
            Self::Silence => "침묵/단답",
            Self::PassiveAggressive => "수동 공격",
            Self::Repetition => "반복",
            Self::MetaConversation => "대화에 대한 대화",
        }
    }
}

/// Attachment pattern signalled by the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentPattern {
    Secure,
    Anxious,
    Avoidant,
    Fearful,
    Ambivalent,
}

impl TaxonomyLabel for AttachmentPattern {
    const CATEGORY: Category = Category::AttachmentPattern;
    const ALL: &'static [Self] = &[
        Self::Secure,
        Self::Anxious,
        Self::Avoidant,
        Self::Fearful,
        Self::Ambivalent,
    ];

    fn id(self) -> &'static str {
        match self {
            Self::Secure => "secure",
            Self::Anxious => "anxious",
            Self::Avoidant => "avoidant",
            Self::Fearful => "fearful",
            Self::Ambivalent => "ambivalent",
        }
    }

    fn display(self) -> &'static str {
        match self {
            Self::Secure => "안정형",
            Self::Anxious => "불안형",
            Self::Avoidant => "회피형",
            Self::Fearful => "두려움형",
            Self::Ambivalent => "양가형",
        }
    }
}

/// What the conversation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicContext {
    Attention,
    Trust,
    Commitment,
    JealousyRelated,
    EmotionalNeeds,
    RoutineCheckin,
}

impl TaxonomyLabel for TopicContext {
    const CATEGORY: Category = Category::TopicContext;
    const ALL: &'static [Self] = &[
        Self::Attention,
        Self::Trust,
        Self::Commitment,
        Self::JealousyRelated,
        Self::EmotionalNeeds,
        Self::RoutineCheckin,
    ];

    fn id(self) -> &'static str {
        match self {
            Self::Attention => "attention",
            Self::Trust => "trust",
            Self::Commitment => "commitment",
            Self::JealousyRelated => "jealousy_related",
            Self::EmotionalNeeds => "emotional_needs",
            Self::RoutineCheckin => "routine_checkin",
        }
    }

    fn display(self) -> &'static str {
        match self {
            Self::Attention => "관심/연락",
            Self::Trust => "신뢰",
            Self::Commitment => "관계의 미래",
            Self::JealousyRelated => "제3자/질투",
            Self::EmotionalNeeds => "정서적 욕구",
            Self::RoutineCheckin => "일상 안부",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ids_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_id(category.id()), Some(category));
        }
        assert_eq!(Category::from_id("mood"), None);
    }

    #[test]
    fn serde_ids_match_label_ids() {
        for label in EmotionExpression::ALL {
            let json = serde_json::to_value(label).unwrap();
            assert_eq!(json, label.id());
        }
        for label in CommunicationStyle::ALL {
            let json = serde_json::to_value(label).unwrap();
            assert_eq!(json, label.id());
        }
        assert_eq!(
            serde_json::to_value(Category::RelationshipAttitude).unwrap(),
            "relationship_attitude"
        );
    }

    #[test]
    fn label_counts_per_category() {
        assert_eq!(Category::EmotionExpression.label_ids().len(), 8);
        assert_eq!(Category::SelfAssertion.label_ids().len(), 6);
        assert_eq!(Category::RelationshipAttitude.label_ids().len(), 5);
        assert_eq!(Category::CommunicationStyle.label_ids().len(), 6);
        assert_eq!(Category::AttachmentPattern.label_ids().len(), 5);
        assert_eq!(Category::TopicContext.label_ids().len(), 6);
    }

    #[test]
    fn label_ids_are_unique_within_category() {
        for category in Category::ALL {
            let ids = category.label_ids();
            let mut deduped = ids.clone();
            deduped.sort_unstable();
            deduped.dedup();
            assert_eq!(ids.len(), deduped.len(), "{}", category.id());
        }
    }

    #[test]
    fn from_id_finds_declared_labels() {
        assert_eq!(
            TopicContext::from_id("jealousy_related"),
            Some(TopicContext::JealousyRelated)
        );
        assert_eq!(AttachmentPattern::from_id("clingy"), None);
        assert_eq!(SelfAssertion::CATEGORY, Category::SelfAssertion);
    }
}
