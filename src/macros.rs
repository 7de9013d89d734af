#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a `Vec<RecordId>` from string literals.
#[macro_export]
macro_rules! ids {
    ($($id:expr),* $(,)?) => {
        vec![ $($crate::RecordId::from($id)),* ]
    };
}

/// Build a [`VerdictRule`](crate::VerdictRule) with sensible defaults.
///
/// ```
/// use verdict_engine::{RuleAction, RuleCondition, VerdictCondition, verdict_rule};
///
/// let rule = verdict_rule! {
///     id: "no-avoid",
///     name: "block avoid ingredients",
///     when: RuleCondition::IngredientVerdict { verdict: VerdictCondition::Avoid },
///     then: RuleAction::SetAvoid,
///     warning: "contains an avoid-class ingredient",
///     priority: 50,
/// };
/// assert!(rule.is_active);
/// assert_eq!(rule.applied_count, 0);
/// ```
#[macro_export]
macro_rules! verdict_rule {
    (
        id: $id:expr,
        name: $name:expr,
        when: $cond:expr,
        then: $action:expr
        $(, warning: $warning:expr)?
        $(, priority: $priority:expr)?
        $(, active: $active:expr)?
        $(,)?
    ) => {{
        #[allow(unused_mut, unused_assignments)]
        let mut warning_message: Option<String> = None;
        $( warning_message = Some(String::from($warning)); )?
        $crate::VerdictRule {
            id: $crate::RecordId::from($id),
            name: String::from($name),
            condition: $cond,
            action: $action,
            warning_message,
            is_active: { true $(&& $active)? },
            priority: { 0 $(+ $priority)? },
            applied_count: 0,
        }
    }};
}
