//! # Help Assistant
//!
//! Answers free-text questions from a fixed rule table. Matching is a plain
//! substring test on the lower-cased message; rules are tried in order and
//! the first hit wins, so a message mentioning both a report keyword and a
//! search keyword gets the report answer and no navigation.

/// Greeting shown when the assistant opens.
const WELCOME: &str =
    "مرحباً! أنا مساعدك الذكي. كيف يمكنني مساعدتك اليوم في البحث عن المفقودات؟";

const FALLBACK: &str = "عذراً، لم أفهم تماماً. هل يمكنك صياغة السؤال بشكل آخر؟ يمكنني مساعدتك في البحث، الإبلاغ، أو شرح الموقع.";

const DEFAULT_RULES: &[Rule] = &[
    Rule {
        name: "report",
        keywords: &["بلاغ", "إضافة", "مفقود"],
        reply: "للإبلاغ عن سيارة مفقودة، يمكنك الضغط على زر \"إبلاغ عن حالة\" في الصفحة الرئيسية، أو الذهاب للوحة التحكم إذا كنت مشرفاً.",
        navigate_to: None,
    },
    Rule {
        name: "search",
        keywords: &["بحث", "تفتيش"],
        reply: "سأخذك لصفحة البحث فوراً. هناك يمكنك البحث بالماركة، الموديل، والمكان.",
        navigate_to: Some("/search"),
    },
    Rule {
        name: "contact",
        keywords: &["تواصل", "رقم"],
        reply: "يمكنك التواصل مع الإدارة عبر صفحة \"اتصل بنا\" أو عبر الأرقام الموحدة للطوارئ.",
        navigate_to: None,
    },
    Rule {
        name: "map",
        keywords: &["خريطة", "موقع"],
        reply: "الخريطة التفاعلية موجودة في صفحة البحث ولوحة التحكم، وتظهر أماكن البلاغات بشكل دقيق.",
        navigate_to: None,
    },
];

const CONTEXT_GREETINGS: &[(&str, &str)] = &[
    (
        "/search",
        "أرى أنك في صفحة البحث. يمكنك استخدام الفلاتر لتضييق النتائج حسب الماركة أو المكان.",
    ),
    (
        "/dashboard",
        "أهلاً بك في لوحة التحكم. هل تحتاج مساعدة في إدارة البلاغات؟",
    ),
];

/// One keyword rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    /// Any of these, as a substring of the lower-cased message, triggers the rule.
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
    /// Path the front-end should open alongside the reply.
    pub navigate_to: Option<&'static str>,
}

impl Rule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// The assistant's answer to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Name of the matching rule, `None` for the fallback.
    pub rule: Option<&'static str>,
    pub text: &'static str,
    pub navigate_to: Option<&'static str>,
}

/// Rule-table help assistant.
#[derive(Debug, Clone)]
pub struct Assistant {
    rules: Vec<Rule>,
    fallback: &'static str,
}

impl Default for Assistant {
    fn default() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec(), FALLBACK)
    }
}

impl Assistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// An assistant with a custom rule table, tried in the given order.
    pub fn with_rules(rules: Vec<Rule>, fallback: &'static str) -> Self {
        Self { rules, fallback }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn welcome(&self) -> &'static str {
        WELCOME
    }

    /// Extra greeting for pages that have one.
    pub fn context_greeting(&self, path: &str) -> Option<&'static str> {
        CONTEXT_GREETINGS
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, greeting)| *greeting)
    }

    /// Answer `message`. Blank messages get no reply.
    pub fn respond(&self, message: &str) -> Option<Reply> {
        if message.trim().is_empty() {
            return None;
        }
        let lowered = message.to_lowercase();

        let reply = match self.rules.iter().find(|rule| rule.matches(&lowered)) {
            Some(rule) => Reply {
                rule: Some(rule.name),
                text: rule.reply,
                navigate_to: rule.navigate_to,
            },
            None => Reply {
                rule: None,
                text: self.fallback,
                navigate_to: None,
            },
        };
        tracing::debug!(rule = reply.rule.unwrap_or("fallback"), "assistant replied");
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_for(message: &str) -> Option<&'static str> {
        Assistant::new().respond(message).and_then(|r| r.rule)
    }

    #[test]
    fn each_rule_fires_on_its_keywords() {
        assert_eq!(rule_for("أريد تقديم بلاغ"), Some("report"));
        assert_eq!(rule_for("سيارة مفقود منذ أمس"), Some("report"));
        assert_eq!(rule_for("كيف أبدأ البحث؟"), Some("search"));
        assert_eq!(rule_for("ما هو رقم الطوارئ"), Some("contact"));
        assert_eq!(rule_for("أين الخريطة"), Some("map"));
    }

    #[test]
    fn search_rule_navigates() {
        let reply = Assistant::new().respond("تفتيش").unwrap();
        assert_eq!(reply.navigate_to, Some("/search"));
    }

    #[test]
    fn report_wins_over_search_without_navigation() {
        let reply = Assistant::new().respond("بحث عن بلاغ قديم").unwrap();
        assert_eq!(reply.rule, Some("report"));
        assert_eq!(reply.navigate_to, None);
    }

    #[test]
    fn earlier_rule_wins_for_contact_and_map_overlap() {
        assert_eq!(rule_for("رقم الموقع"), Some("contact"));
    }

    #[test]
    fn unmatched_message_gets_fallback() {
        let reply = Assistant::new().respond("hello there").unwrap();
        assert_eq!(reply.rule, None);
        assert_eq!(reply.text, FALLBACK);
        assert_eq!(reply.navigate_to, None);
    }

    #[test]
    fn blank_message_gets_no_reply() {
        assert!(Assistant::new().respond("   ").is_none());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let assistant = Assistant::with_rules(
            vec![Rule {
                name: "help",
                keywords: &["help"],
                reply: "ok",
                navigate_to: None,
            }],
            "?",
        );
        assert_eq!(assistant.respond("HELP me").unwrap().rule, Some("help"));
    }

    #[test]
    fn context_greetings_only_for_known_pages() {
        let assistant = Assistant::new();
        assert!(assistant.context_greeting("/search").is_some());
        assert!(assistant.context_greeting("/dashboard").is_some());
        assert!(assistant.context_greeting("/").is_none());
        assert!(assistant.context_greeting("/search/results").is_none());
    }
}
