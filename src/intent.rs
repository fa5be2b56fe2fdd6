/// Question categories answerable from the contracts store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ScheduleRisk,
    OverBudget,
    VendorRedFlags,
    Concerns,
    RemainingBudget,
    LargestProjects,
    BudgetSummary,
    TopVendor,
    SchoolsByProjects,
    CategorySplit,
    UpcomingCompletions,
    VendorQuery,
    SpecificProject,
    Fallback,
}

/// Ordered dispatch rules. Evaluation is top-to-bottom and the first rule
/// with any keyword present in the question wins, so broader keyword sets
/// ("risk", "vendor") must stay below the more specific ones that share
/// vocabulary with them.
pub const RULES: &[(Intent, &[&str])] = &[
    (
        Intent::ScheduleRisk,
        &["schedule risk", "behind schedule", "delayed", "30 days"],
    ),
    (
        Intent::OverBudget,
        &["over budget", "budget alert", "cost overrun"],
    ),
    (
        Intent::VendorRedFlags,
        &["vendor red flag", "change order", "vendor problem", "struggling"],
    ),
    (Intent::Concerns, &["worried", "concern", "risk", "problem"]),
    (
        Intent::RemainingBudget,
        &["remaining", "left to spend", "unspent"],
    ),
    (
        Intent::LargestProjects,
        &["largest", "biggest", "top 5", "top five"],
    ),
    (
        Intent::BudgetSummary,
        &["total", "summary", "where we stand", "spent vs budget"],
    ),
    (
        Intent::TopVendor,
        &["top vendor", "highest contract", "biggest vendor"],
    ),
    (Intent::SchoolsByProjects, &["school", "most project"]),
    (
        Intent::CategorySplit,
        &["category", "split", "construction", "renovation"],
    ),
    (
        Intent::UpcomingCompletions,
        &["completing", "next 90", "upcoming"],
    ),
    (Intent::VendorQuery, &["vendor", "contractor", "company"]),
    (
        Intent::SpecificProject,
        &["high school", "south marion", "ccc"],
    ),
];

/// Classify a question by substring match against the ordered rule list.
/// Matching is case-insensitive; anything unmatched falls through to the
/// static help intent.
pub fn classify(question: &str) -> Intent {
    let question = question.to_lowercase();

    for (intent, keywords) in RULES {
        if keywords.iter().any(|kw| question.contains(kw)) {
            return *intent;
        }
    }

    Intent::Fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_route_to_their_intent() {
        assert_eq!(classify("which projects are behind schedule?"), Intent::ScheduleRisk);
        assert_eq!(classify("any cost overrun this quarter?"), Intent::OverBudget);
        assert_eq!(classify("how much is left to spend?"), Intent::RemainingBudget);
        assert_eq!(classify("top five projects"), Intent::LargestProjects);
        assert_eq!(classify("spending by category"), Intent::CategorySplit);
        assert_eq!(classify("what is completing soon?"), Intent::UpcomingCompletions);
    }

    #[test]
    fn earlier_rule_wins_on_overlap() {
        // "delayed" (schedule risk) outranks "worried" (general concern).
        assert_eq!(classify("worried about delayed projects"), Intent::ScheduleRisk);
        // "change order" outranks the bare "vendor" rule further down.
        assert_eq!(classify("vendor change order volume"), Intent::VendorRedFlags);
        // "school" outranks "construction".
        assert_eq!(classify("school construction projects"), Intent::SchoolsByProjects);
    }

    #[test]
    fn general_concern_catches_bare_risk_words() {
        assert_eq!(classify("should I be worried?"), Intent::Concerns);
        assert_eq!(classify("any problems?"), Intent::Concerns);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("ANY PROJECTS DELAYED?"), Intent::ScheduleRisk);
        assert_eq!(classify("Top Vendor by value"), Intent::TopVendor);
    }

    #[test]
    fn unmatched_question_falls_back() {
        assert_eq!(classify("what's the weather like?"), Intent::Fallback);
    }

    #[test]
    fn bare_vendor_word_is_the_generic_vendor_intent() {
        assert_eq!(classify("list every contractor"), Intent::VendorQuery);
    }
}
