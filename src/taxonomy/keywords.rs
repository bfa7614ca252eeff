//! Keyword dictionary: trigger substrings for every taxonomy label.
//!
//! Matching is exact, case-sensitive substring containment. Tables keep the
//! category's declared label order.

use super::{
    AttachmentPattern, Category, CommunicationStyle, EmotionExpression, RelationshipAttitude,
    SelfAssertion, TaxonomyLabel, TopicContext,
};

type Table<L> = &'static [(L, &'static [&'static str])];

const EMOTION_EXPRESSION: Table<EmotionExpression> = &[
    (EmotionExpression::Affection, &["사랑해", "보고 싶어", "소중해"]),
    (
        EmotionExpression::Frustration,
        &["짜증", "실망", "좌절", "또 이래", "짜증 나"],
    ),
    (
        EmotionExpression::Anxiety,
        &["불안", "걱정", "불신", "나 혼자만 노력"],
    ),
    (EmotionExpression::Gratitude, &["고마워", "덕분이야"]),
    (EmotionExpression::Jealousy, &["질투", "비교", "더 자주 연락"]),
    (EmotionExpression::Resentment, &["분노", "억울", "바보 된 기분"]),
    (EmotionExpression::Loneliness, &["외로움", "나 혼자인 것"]),
    (EmotionExpression::Sadness, &["슬픔", "눈물 나네"]),
];

const SELF_ASSERTION: Table<SelfAssertion> = &[
    (
        SelfAssertion::Request,
        &["시간 좀 보내줄래", "해줄래", "원해", "바래"],
    ),
    (
        SelfAssertion::Complaint,
        &["불만", "비판", "항상 자기 생각만 해"],
    ),
    (
        SelfAssertion::Boundaries,
        &["한계", "더 이상 이 얘기", "그만하자"],
    ),
    (SelfAssertion::Expectation, &["기대", "챙겨줄 줄 알았어"]),
    (SelfAssertion::Reproach, &["질책", "비난", "네가 잘못했잖아"]),
    (
        SelfAssertion::Withdrawal,
        &["거리 두기", "생각할 시간이 필요해"],
    ),
];

const RELATIONSHIP_ATTITUDE: Table<RelationshipAttitude> = &[
    (
        RelationshipAttitude::Accommodating,
        &["네 입장도 알겠어", "이해해"],
    ),
    (RelationshipAttitude::Withdrawing, &["회피", "말 안 할래", "됐고"]),
    (
        RelationshipAttitude::Confronting,
        &["직면", "문제 제기", "반드시 하고 넘어가야 해"],
    ),
    (
        RelationshipAttitude::Reconnecting,
        &["다시 잘 해보자", "관계 회복"],
    ),
    (
        RelationshipAttitude::Testing,
        &["시험", "넌 어떻게 생각해", "그냥 해봤어"],
    ),
];

const COMMUNICATION_STYLE: Table<CommunicationStyle> = &[
    (
        CommunicationStyle::Question,
        &["?", "왜", "어디", "뭐해", "언제", "어떻게"],
    ),
    (
        CommunicationStyle::Explanation,
        &["때문에", "이유", "있어서", "해서"],
    ),
    (CommunicationStyle::Silence, &["응", "알겠어", "…", "..."]),
    (
        CommunicationStyle::PassiveAggressive,
        &["역시 너답네", "그럴 줄 알았어"],
    ),
    (
        CommunicationStyle::Repetition,
        &["몇 번이나 말했잖아", "계속 말했잖아"],
    ),
    (
        CommunicationStyle::MetaConversation,
        &["대화가 안 되는 것 같아", "이야기 자체"],
    ),
];

const ATTACHMENT_PATTERN: Table<AttachmentPattern> = &[
    (AttachmentPattern::Secure, &["믿어", "신뢰해"]),
    (AttachmentPattern::Anxious, &["싫어진 거야", "불안해", "거절"]),
    (AttachmentPattern::Avoidant, &["됐어", "별일 아냐", "괜찮아"]),
    (
        AttachmentPattern::Fearful,
        &["좋아하지만 다치긴 싫어", "불안하면서도"],
    ),
    (
        AttachmentPattern::Ambivalent,
        &["좋아하면서도 멀어지고 싶어", "모순적"],
    ),
];

const TOPIC_CONTEXT: Table<TopicContext> = &[
    (
        TopicContext::Attention,
        &["왜 연락 안 해", "관심 없어", "신경 안 써"],
    ),
    (TopicContext::Trust, &["정말 사실대로", "거짓말", "믿어도 돼?"]),
    (TopicContext::Commitment, &["앞으로 어떻게", "확신", "미래"]),
    (
        TopicContext::JealousyRelated,
        &["제3자", "걔랑", "다른 사람이랑"],
    ),
    (TopicContext::EmotionalNeeds, &["안아줬으면", "위로", "지지"]),
    (TopicContext::RoutineCheckin, &["밥은 먹었어", "잘 자", "일상"]),
];

/// Trigger keywords for one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordEntry {
    pub category: Category,
    /// Stable label identifier.
    pub label: &'static str,
    pub display: &'static str,
    pub keywords: &'static [&'static str],
}

impl KeywordEntry {
    /// First keyword contained in `text`, if any.
    pub fn first_match(&self, text: &str) -> Option<&'static str> {
        self.keywords.iter().copied().find(|kw| text.contains(kw))
    }
}

/// Keyword tables for every category, in taxonomy order.
#[derive(Debug, Clone)]
pub struct KeywordDictionary {
    groups: Vec<(Category, Vec<KeywordEntry>)>,
}

impl KeywordDictionary {
    /// The built-in dictionary covering all six categories.
    pub fn standard() -> Self {
        let groups = Category::ALL
            .into_iter()
            .map(|category| (category, standard_entries(category)))
            .collect();
        Self { groups }
    }

    /// A dictionary with no keywords (matches nothing).
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    /// Entries grouped by category, categories and labels in declared order.
    pub fn groups(&self) -> impl Iterator<Item = (Category, &[KeywordEntry])> {
        self.groups
            .iter()
            .map(|(category, entries)| (*category, entries.as_slice()))
    }

    /// Entries of one category.
    pub fn entries(&self, category: Category) -> &[KeywordEntry] {
        self.groups
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn keyword_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|(_, entries)| entries.iter())
            .map(|e| e.keywords.len())
            .sum()
    }
}

impl Default for KeywordDictionary {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_entries(category: Category) -> Vec<KeywordEntry> {
    match category {
        Category::EmotionExpression => entries_of(EMOTION_EXPRESSION),
        Category::SelfAssertion => entries_of(SELF_ASSERTION),
        Category::RelationshipAttitude => entries_of(RELATIONSHIP_ATTITUDE),
        Category::CommunicationStyle => entries_of(COMMUNICATION_STYLE),
        Category::AttachmentPattern => entries_of(ATTACHMENT_PATTERN),
        Category::TopicContext => entries_of(TOPIC_CONTEXT),
    }
}

fn entries_of<L: TaxonomyLabel>(table: Table<L>) -> Vec<KeywordEntry> {
    table
        .iter()
        .map(|&(label, keywords)| KeywordEntry {
            category: L::CATEGORY,
            label: label.id(),
            display: label.display(),
            keywords,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_has_keywords_in_declared_order() {
        let dict = KeywordDictionary::standard();
        for category in Category::ALL {
            let labels: Vec<&str> = dict.entries(category).iter().map(|e| e.label).collect();
            assert_eq!(labels, category.label_ids(), "{}", category.id());
        }
    }

    #[test]
    fn keywords_are_non_empty() {
        let dict = KeywordDictionary::standard();
        for (_, entries) in dict.groups() {
            for entry in entries {
                assert!(!entry.keywords.is_empty(), "{} has no keywords", entry.label);
                assert!(entry.keywords.iter().all(|kw| !kw.is_empty()));
            }
        }
    }

    #[test]
    fn groups_follow_category_order() {
        let dict = KeywordDictionary::standard();
        let order: Vec<Category> = dict.groups().map(|(c, _)| c).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }

    #[test]
    fn first_match_reports_keyword() {
        let dict = KeywordDictionary::standard();
        let frustration = dict.entries(Category::EmotionExpression)[1];
        assert_eq!(frustration.label, "frustration");
        assert_eq!(frustration.first_match("진짜 짜증 나"), Some("짜증"));
        assert_eq!(frustration.first_match("좋은 하루"), None);
    }

    #[test]
    fn empty_dictionary_has_no_entries() {
        let dict = KeywordDictionary::empty();
        assert_eq!(dict.keyword_count(), 0);
        assert!(dict.entries(Category::TopicContext).is_empty());
    }
}
