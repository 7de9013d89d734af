use ansi::{Palette, Tone};
use verdict_engine::{DecisionVerbose, FreshnessStatus, MatchType, Severity, VerdictSource};

mod ansi {
    /// What a piece of output means; the palette picks the escape code.
    #[derive(Clone, Copy)]
    pub enum Tone {
        Good,
        Warn,
        Bad,
        Label,
        Accent,
        Rule,
        Strong,
        Faint,
    }

    impl Tone {
        fn code(self) -> &'static str {
            match self {
                Tone::Good => "\x1b[32m",
                Tone::Warn => "\x1b[33m",
                Tone::Bad => "\x1b[31m",
                Tone::Label => "\x1b[34m",
                Tone::Accent => "\x1b[36m",
                Tone::Rule => "\x1b[90m",
                Tone::Strong => "\x1b[1m",
                Tone::Faint => "\x1b[2m",
            }
        }
    }

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn tone(&self, s: impl AsRef<str>, tone: Tone) -> String {
            if self.enabled { format!("{}{}\x1b[0m", tone.code(), s.as_ref()) } else { s.as_ref().to_string() }
        }

        pub fn strong(&self, s: impl AsRef<str>) -> String {
            self.tone(s, Tone::Strong)
        }

        pub fn faint(&self, s: impl AsRef<str>) -> String {
            self.tone(s, Tone::Faint)
        }

        pub fn heading(&self, title: &str) -> String {
            self.tone(format!("━━━ {title} ━━━"), Tone::Rule)
        }
    }
}

pub fn print_run(ingredients: &str, run: &DecisionVerbose, color: bool) {
    let palette = Palette::new(color);
    let decision = &run.decision;
    let details = &run.details;

    println!("\n{}", palette.strong(palette.tone(format!("⚖  Deciding: \"{}\"", ingredients.trim()), Tone::Accent)));

    println!("\n{}", palette.heading("Ingredients"));
    if decision.parsed.is_empty() {
        println!("{}", palette.faint("  No ingredient tokens"));
    }
    for (idx, parsed) in decision.parsed.iter().enumerate() {
        let index = palette.tone(format!("[{idx}]"), Tone::Rule);
        match (parsed.match_type, &parsed.matched_canonical_name) {
            (Some(match_type), Some(canonical)) => {
                let how = match (match_type, parsed.fuzzy_distance) {
                    (MatchType::Fuzzy, Some(d)) => format!("fuzzy d={d}"),
                    _ => match_type.as_str().to_string(),
                };
                let verdict = parsed.verdict.map(|v| v.as_str()).unwrap_or("unknown");
                println!(
                    "  {} {} {} {} {}",
                    index,
                    palette.tone(&parsed.normalized, Tone::Label),
                    palette.faint("→"),
                    palette.strong(palette.tone(canonical, Tone::Good)),
                    palette.faint(format!("({how}, {verdict})")),
                );
            }
            _ => println!("  {} {} {}", index, palette.tone(&parsed.normalized, Tone::Warn), palette.faint("✗ unmatched")),
        }
    }

    println!("\n{}", palette.heading("Rules"));
    if details.evaluations.is_empty() {
        println!("{}", palette.faint("  No active rules"));
    }
    for evaluation in &details.evaluations {
        let mark = if evaluation.matched {
            palette.tone("✓", Tone::Good)
        } else {
            palette.faint("·")
        };
        println!(
            "  {} {} {}",
            mark,
            palette.tone(&evaluation.rule_name, Tone::Label),
            palette.faint(format!("│ {}", evaluation.action.as_str())),
        );
        if let Some(message) = &evaluation.message {
            println!("      {}", palette.tone(message, Tone::Warn));
        }
    }

    if !decision.conflicts.conflicts.is_empty() {
        println!("\n{}", palette.heading("Conflicts"));
        for conflict in &decision.conflicts.conflicts {
            let tone = match conflict.severity {
                Severity::Error => Tone::Bad,
                Severity::Warning => Tone::Warn,
            };
            println!("  {} {}", palette.tone(format!("[{:?}]", conflict.severity), tone), conflict.message);
        }
    }

    println!("\n{}", palette.heading("Decision"));
    let verdict = decision.verdict.map(|v| v.as_str()).unwrap_or("undetermined");
    let source = match decision.verdict_source {
        VerdictSource::Proposed => "proposed",
        VerdictSource::Rules => "rules",
        VerdictSource::Ingredients => "ingredients",
        VerdictSource::Undetermined => "nothing matched",
    };
    println!("  Verdict: {} {}", palette.strong(verdict), palette.faint(format!("(from {source})")));
    if let Some(hydration) = &decision.hydration {
        let note = if hydration.created { "created" } else { "existing" };
        println!("  Category: {} {}", palette.tone(&hydration.category_id, Tone::Label), palette.faint(format!("({note})")));
    }
    let save = if !decision.can_save {
        palette.strong(palette.tone("✗ vetoed", Tone::Bad))
    } else if decision.conflicts.overridden {
        palette.tone("✓ allowed (override)", Tone::Warn)
    } else {
        palette.tone("✓ allowed", Tone::Good)
    };
    println!("  Save: {save}");
    if decision.publish_blocked {
        println!("  Publish: {}", palette.tone("blocked", Tone::Bad));
    }
    let freshness = match (decision.freshness.status, decision.freshness.days_since_review) {
        (FreshnessStatus::NeverReviewed, _) | (_, None) => palette.faint("never reviewed"),
        (FreshnessStatus::Fresh, Some(days)) => palette.tone(format!("fresh ({days}d)"), Tone::Good),
        (FreshnessStatus::Aging, Some(days)) => palette.tone(format!("aging ({days}d)"), Tone::Warn),
        (FreshnessStatus::Stale, Some(days)) => palette.tone(format!("stale ({days}d)"), Tone::Bad),
    };
    println!("  Review: {freshness}");

    println!("\n{}", palette.heading("Timing"));
    let m = &details.metrics;
    println!(
        "  Total: {}  │  Fetch: {}  │  Resolve: {}  │  Rules: {}  │  Detect: {}",
        palette.tone(format!("{:?}", m.total), Tone::Good),
        palette.faint(format!("{:?}", m.fetch)),
        palette.tone(format!("{:?}", m.resolve), Tone::Accent),
        palette.faint(format!("{:?}", m.evaluate)),
        palette.faint(format!("{:?}", m.detect)),
    );
    println!(
        "  {}",
        palette.faint(format!("{} catalog entries, {} rules recorded", details.catalog_size, details.rules_recorded))
    );
    println!();
}
