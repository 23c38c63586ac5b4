//! Plain-text messages for the chat.

use crate::community::analysis::{CommunityReport, Lean, Tone};
use crate::community::Group;
use crate::quiz::catalog::{QuestionCatalog, TypeCatalog, TypeProfile};
use crate::quiz::matching::{find_matches, TypeMatch};
use crate::quiz::session::ResultSnapshot;
use crate::quiz::type_code::TypeCode;
use crate::quiz::{Axis, Pole, Question};

const BAR_WIDTH: u32 = 10;

fn bar(percent: u32) -> String {
    let filled = (percent.min(100) * BAR_WIDTH + 50) / 100;
    let mut out = "█".repeat(filled as usize);
    out.push_str(&"░".repeat((BAR_WIDTH - filled) as usize));
    out
}

fn axis_label(axis: Axis) -> &'static str {
    match axis {
        Axis::EI => "Energy direction",
        Axis::SN => "Perception",
        Axis::TF => "Judgement",
        Axis::JP => "Lifestyle",
    }
}

pub fn question(index: usize, total: usize, question: &Question) -> String {
    format!(
        "Question {} / {}\n\nQ{}. {}\n\n1 = not at all like me … 5 = exactly like me",
        index + 1,
        total,
        index + 1,
        question.text
    )
}

fn type_title(code: &TypeCode, types: Option<&TypeCatalog>) -> String {
    match types.and_then(|t| t.get(code)) {
        Some(profile) => format!("{} ({code})", profile.name),
        None => code.to_string(),
    }
}

fn match_line(m: &TypeMatch, types: Option<&TypeCatalog>) -> String {
    let strength = types
        .and_then(|t| t.get(&m.code))
        .map(|p| format!(" · {}", p.strength))
        .unwrap_or_default();
    format!("• {}{strength}", type_title(&m.code, types))
}

pub fn profile(profile: &TypeProfile) -> String {
    format!(
        "{}\n{}\n\n{}\n\nStrength: {}\nWeakness: {}\n\n📖 {} – {}",
        profile.code,
        profile.name,
        profile.summary,
        profile.strength,
        profile.weakness,
        profile.bible_character,
        profile.bible_character_desc,
    )
}

pub fn verse(profile: &TypeProfile) -> String {
    let mut text = format!("📖 {}\n{}", profile.verse_ref, profile.verse_text);
    if !profile.verse_apply.is_empty() {
        text.push_str("\n\n");
        text.push_str(&profile.verse_apply);
    }
    text
}

pub fn result(
    snapshot: &ResultSnapshot,
    questions: Option<&QuestionCatalog>,
    types: Option<&TypeCatalog>,
) -> String {
    let card = &snapshot.card;
    let mut text = match types.and_then(|t| t.get(&card.type_code)) {
        Some(p) => profile(p),
        None => card.type_code.to_string(),
    };

    text.push_str("\n\nYour balance\n");
    for axis in Axis::ALL {
        let limit = questions.map(|q| q.axis_limit(axis)).unwrap_or(0);
        let positive = card.axis_scores.positive_share(axis, limit);
        text.push_str(&format!(
            "{}: {} {}% {} {} {}%\n",
            axis_label(axis),
            axis.positive(),
            positive,
            bar(positive),
            axis.negative(),
            100 - positive,
        ));
    }

    text.push_str("\nLetter scores\n");
    for pole in Pole::ALL {
        let limit = questions.map(|q| q.side_limit(pole)).unwrap_or(0);
        let share = card.scores.share(pole, limit);
        text.push_str(&format!("{pole} ({}) {}\n", card.scores.get(pole), bar(share)));
    }

    if let Some(types) = types {
        let matches = find_matches(&card.type_code, types.codes());
        if !matches.closest.is_empty() {
            text.push_str("\nWalks closest with you\n");
            for m in &matches.closest {
                text.push_str(&match_line(m, Some(types)));
                text.push('\n');
            }
        }
        if let Some(opposite) = &matches.opposite {
            text.push_str("\nMost different from you\n");
            text.push_str(&match_line(opposite, Some(types)));
            text.push('\n');
        }
    }
    text
}

pub fn group(group: &Group, types: Option<&TypeCatalog>) -> String {
    if group.members.is_empty() {
        return format!("🏠 {}\n\nNo results saved yet.", group.name);
    }
    let mut text = format!("🏠 {} · {} people\n", group.name, group.members.len());
    for member in &group.members {
        let desc = member
            .type_code
            .parse::<TypeCode>()
            .ok()
            .and_then(|code| types.and_then(|t| t.get(&code)))
            .map(|p| p.strength.clone())
            .unwrap_or_else(|| member.note.clone());
        text.push_str(&format!(
            "\n{} · {} · {}\n  id: {}",
            member.name, member.type_code, desc, member.id
        ));
    }
    text
}

fn meeting_style(report: &CommunityReport) -> Vec<&'static str> {
    let energy = match report.lean(Axis::EI) {
        Lean::Balanced => "Lively and deep at once: energetic sharing and quiet reflection sit side by side.",
        Lean::Toward(Pole::E) => "Full of energy: someone always starts the conversation. Make sure the loudest voices do not carry every meeting.",
        Lean::Toward(_) => "Calm and deep: you prefer small circles and long conversations. Do not be afraid of silence.",
    };
    let rhythm = match report.lean(Axis::JP) {
        Lean::Balanced => "Plan and flexibility in harmony: you keep the frame and adapt inside it.",
        Lean::Toward(Pole::J) => "Step by step: clear start and end times and a set order suit you.",
        Lean::Toward(_) => "Go with the flow: changes in the order are welcome. Someone should own the wrap-up.",
    };
    vec![energy, rhythm]
}

fn minority_note(pole: Pole) -> &'static str {
    match pole {
        Pole::I => "Introverts (I) can be drained in high-energy meetings. Give them time to think.",
        Pole::E => "Extraverts (E) can feel stifled when it is too quiet. Give them room to speak up.",
        Pole::S => "Sensing members (S) like concrete applications.",
        Pole::N => "Intuitive members (N) come alive with big questions about the community's calling.",
        Pole::F => "Feeling members (F) want to know that hearts have been heard.",
        Pole::T => "Thinking members (T) want the reasons behind decisions.",
        Pole::J | Pole::P => "",
    }
}

fn growth_guide(axis: Axis, lean: Lean) -> &'static str {
    match (axis, lean) {
        (Axis::EI, Lean::Balanced) => "Speaking and listening are in good proportion.",
        (Axis::EI, Lean::Toward(Pole::E)) => "Practise listening: make room for holy silence.",
        (Axis::EI, _) => "Practise expression: say aloud what grace has done.",
        (Axis::SN, Lean::Balanced) => "Dreamers and builders walk together here.",
        (Axis::SN, Lean::Toward(Pole::S)) => "Holy imagination: look past today's problem to the bigger picture.",
        (Axis::SN, _) => "Holy detail: do not skip the small obedience due today.",
        (Axis::TF, Lean::Balanced) => "Clear judgement and warm empathy meet.",
        (Axis::TF, Lean::Toward(Pole::T)) => "Warm it up: meet hearts before you hand out answers.",
        (Axis::TF, _) => "Speak the truth in love for the sake of healthy relationships.",
        (Axis::JP, Lean::Balanced) => "You have both steady structure and room to move.",
        (Axis::JP, Lean::Toward(Pole::J)) => "Leave margins: welcome what does not go to plan.",
        (Axis::JP, _) => "Small orders like start times and promises build trust.",
    }
}

pub fn report(report: &CommunityReport, types: Option<&TypeCatalog>) -> String {
    let top = report
        .top_types
        .iter()
        .map(TypeCode::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let name = types
        .and_then(|t| t.get(&report.lookup_code))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| report.lookup_code.to_string());

    let mut text = format!(
        "📊 Our community\n\nPeople analysed: {}\nMost common: {top} ({} people)\n\nOverall leaning: {}\n\"{name}\"{}\n",
        report.total,
        report.top_count,
        report.display_code,
        if report.hybrid { " · blended" } else { "" },
    );

    let spread = report
        .type_counts
        .iter()
        .map(|(code, count)| format!("{code} ×{count}"))
        .collect::<Vec<_>>()
        .join(", ");
    text.push_str(&format!("Types present: {spread}\n"));

    text.push_str("\n⚖️ Balance\n");
    for b in &report.balances {
        let badge = match b.tone {
            Tone::Even => " · perfectly even",
            Tone::Golden => " · golden balance",
            Tone::Leaning => "",
        };
        text.push_str(&format!(
            "{}{badge}\n{} {} ({}%) {} {} {} ({}%)\n",
            axis_label(b.axis),
            b.axis.positive(),
            b.positive,
            b.positive_pct,
            bar(b.positive_pct),
            b.axis.negative(),
            b.negative,
            b.negative_pct,
        ));
    }

    text.push_str("\n🗣️ Meeting style\n");
    for line in meeting_style(report) {
        text.push_str(line);
        text.push('\n');
    }

    text.push_str("\n💎 Hidden gems\n");
    if report.minorities.is_empty() {
        text.push_str("No one is left out: keep learning from each other.\n");
    } else {
        for pole in &report.minorities {
            text.push_str(minority_note(*pole));
            text.push('\n');
        }
    }

    text.push_str("\n🌱 Growing together\n");
    for axis in Axis::ALL {
        text.push_str(growth_guide(axis, report.lean(axis)));
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::analysis::analyze;
    use crate::community::Member;
    use crate::quiz::scoring::calculate_result;
    use crate::quiz::{AnswerSet, QuestionId, Rating};

    #[test]
    fn bar_scales_to_width() {
        assert_eq!(bar(0), "░░░░░░░░░░");
        assert_eq!(bar(100), "██████████");
        assert_eq!(bar(55), "██████░░░░");
    }

    #[test]
    fn question_is_numbered_from_one() {
        let q = Question::new(7, "I pray best in the morning", Pole::J);
        assert!(question(0, 40, &q).starts_with("Question 1 / 40\n\nQ1. I pray best in the morning"));
    }

    #[test]
    fn result_without_catalogs_still_renders() {
        let questions = QuestionCatalog::new(vec![Question::new(1, "a", Pole::E)]).unwrap();
        let answers = AnswerSet::from_iter([(QuestionId(1), Rating::new(5).unwrap())]);
        let snapshot = ResultSnapshot {
            card: calculate_result(Some(questions.questions()), &answers),
            completed_at: 0,
        };
        let text = result(&snapshot, Some(&questions), None);
        assert!(text.starts_with("ESTJ"));
        assert!(text.contains("Energy direction: E 100%"));
        assert!(!text.contains("closest"));
    }

    #[test]
    fn report_mentions_tied_label() {
        let members = ["ESTJ", "ISTJ"]
            .iter()
            .enumerate()
            .map(|(i, t)| Member {
                id: i.to_string(),
                name: format!("m{i}"),
                type_code: t.to_string(),
                note: String::new(),
                created_at: 0,
            })
            .collect::<Vec<_>>();
        let text = report(&analyze(&members).unwrap(), None);
        assert!(text.contains("E/I - S - T - J"));
        assert!(text.contains("\"ESTJ\" · blended"));
        assert!(text.contains("Types present: ESTJ ×1, ISTJ ×1"));
    }
}
