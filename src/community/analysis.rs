//! Tallies a group's recorded types into a community profile.
//!
//! The lookup code breaks ties toward E/S/T/J, the same rule used when resolving an
//! individual result, while the display label shows a tie as both letters ("E/I").

use super::Member;
use crate::quiz::type_code::TypeCode;
use crate::quiz::{Axis, Pole};

/// Letters checked for under-representation, in report order.
const MINORITY_ORDER: [Pole; 6] = [Pole::I, Pole::E, Pole::S, Pole::N, Pole::F, Pole::T];
/// Gap (in percentage points) under which a non-tied axis still counts as balanced.
const GOLDEN_GAP: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Even,
    Golden,
    Leaning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisBalance {
    pub axis: Axis,
    pub positive: usize,
    pub negative: usize,
    pub positive_pct: u32,
    pub negative_pct: u32,
    pub tone: Tone,
}

/// Which way a group leans on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lean {
    Balanced,
    Toward(Pole),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityReport {
    pub total: usize,
    letter_counts: [usize; 8],
    /// Per-type counts in first-seen order.
    pub type_counts: Vec<(TypeCode, usize)>,
    /// Every type sharing the highest count, first-seen order.
    pub top_types: Vec<TypeCode>,
    pub top_count: usize,
    pub display_code: String,
    pub lookup_code: TypeCode,
    pub hybrid: bool,
    pub balances: [AxisBalance; 4],
    pub minorities: Vec<Pole>,
}

impl CommunityReport {
    pub fn count(&self, pole: Pole) -> usize {
        self.letter_counts[pole.index()]
    }

    pub fn lean(&self, axis: Axis) -> Lean {
        let positive = self.count(axis.positive());
        let negative = self.count(axis.negative());
        if positive == negative {
            Lean::Balanced
        } else if positive > negative {
            Lean::Toward(axis.positive())
        } else {
            Lean::Toward(axis.negative())
        }
    }
}

/// `None` when there is nobody to analyse.
pub fn analyze(members: &[Member]) -> Option<CommunityReport> {
    if members.is_empty() {
        return None;
    }
    let total = members.len();

    let mut letter_counts = [0usize; 8];
    let mut type_counts: Vec<(TypeCode, usize)> = Vec::new();
    for member in members {
        let Ok(code) = member.type_code.parse::<TypeCode>() else {
            log::debug!("Skipping member {} with type {:?}", member.name, member.type_code);
            continue;
        };
        for pole in code.poles() {
            letter_counts[pole.index()] += 1;
        }
        match type_counts.iter_mut().find(|(seen, _)| *seen == code) {
            Some((_, count)) => *count += 1,
            None => type_counts.push((code, 1)),
        }
    }

    let top_count = type_counts.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let top_types = type_counts
        .iter()
        .filter(|(_, count)| *count == top_count)
        .map(|(code, _)| *code)
        .collect();

    let count = |pole: Pole| letter_counts[pole.index()];

    let display_code = Axis::ALL
        .into_iter()
        .map(|axis| {
            let (pos, neg) = (axis.positive(), axis.negative());
            if count(pos) == count(neg) {
                format!("{pos}/{neg}")
            } else if count(pos) > count(neg) {
                pos.to_string()
            } else {
                neg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" - ");

    let lookup_code = TypeCode::from_fn(|axis| {
        if count(axis.positive()) >= count(axis.negative()) {
            axis.positive()
        } else {
            axis.negative()
        }
    });

    let hybrid = Axis::ALL
        .into_iter()
        .any(|axis| count(axis.positive()) == count(axis.negative()));

    let balances = Axis::ALL.map(|axis| balance(axis, count(axis.positive()), count(axis.negative()), total));

    // Under 40% of the group but present
    let minorities = MINORITY_ORDER
        .into_iter()
        .filter(|&pole| count(pole) > 0 && count(pole) * 10 < total * 4)
        .collect();

    Some(CommunityReport {
        total,
        letter_counts,
        type_counts,
        top_types,
        top_count,
        display_code,
        lookup_code,
        hybrid,
        balances,
        minorities,
    })
}

fn balance(axis: Axis, positive: usize, negative: usize, total: usize) -> AxisBalance {
    // round(positive / total * 100), halves rounding up
    let positive_pct = ((positive * 200 + total) / (2 * total)) as u32;
    let negative_pct = 100u32.saturating_sub(positive_pct);
    let tone = if positive == negative {
        Tone::Even
    } else if positive_pct.abs_diff(negative_pct) < GOLDEN_GAP {
        Tone::Golden
    } else {
        Tone::Leaning
    };
    AxisBalance {
        axis,
        positive,
        negative,
        positive_pct,
        negative_pct,
        tone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(types: &[&str]) -> Vec<Member> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| Member {
                id: format!("m{i}"),
                name: format!("member {i}"),
                type_code: t.to_string(),
                note: String::new(),
                created_at: i as u64,
            })
            .collect()
    }

    #[test]
    fn empty_group_has_no_report() {
        assert_eq!(analyze(&[]), None);
    }

    #[test]
    fn tie_shows_both_letters_but_looks_up_positive_pole() {
        let report = analyze(&members(&["ESTJ", "ISTJ"])).unwrap();
        assert_eq!(report.display_code, "E/I - S - T - J");
        assert_eq!(report.lookup_code.to_string(), "ESTJ");
        assert!(report.hybrid);
        assert_eq!(report.lean(Axis::EI), Lean::Balanced);
        assert_eq!(report.lean(Axis::SN), Lean::Toward(Pole::S));
    }

    #[test]
    fn counts_types_and_most_common() {
        let report = analyze(&members(&["INFP", "ENTJ", "INFP", "ENTJ", "ISFJ"])).unwrap();
        assert_eq!(report.total, 5);
        assert_eq!(report.top_count, 2);
        let top = report.top_types.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        assert_eq!(top, vec!["INFP", "ENTJ"]);
        assert_eq!(report.count(Pole::I), 3);
        assert_eq!(report.count(Pole::E), 2);
        assert_eq!(report.display_code, "I - N - F - J");
        assert_eq!(report.lookup_code.to_string(), "INFJ");
        assert!(!report.hybrid);
    }

    #[test]
    fn malformed_types_count_toward_total_only() {
        let report = analyze(&members(&["ENFJ", "", "XYZ1", "ENF"])).unwrap();
        assert_eq!(report.total, 4);
        assert_eq!(report.count(Pole::E), 1);
        assert_eq!(report.type_counts.len(), 1);
    }

    #[test]
    fn balance_tones_follow_the_gap() {
        // EI: 3 vs 2 of 5 -> 60/40, gap 20 -> leaning
        // SN: 1 vs 1 of 2 in another group -> even
        let report = analyze(&members(&["ESTJ", "ESTP", "ENFJ", "INFP", "ISFJ"])).unwrap();
        let ei = report.balances[Axis::EI.index()];
        assert_eq!((ei.positive_pct, ei.negative_pct, ei.tone), (60, 40, Tone::Leaning));

        let report = analyze(&members(&[
            "ESTJ", "ESTJ", "ESTJ", "ESTJ", "INTJ", "INTJ", "INTJ",
        ]))
        .unwrap();
        // 4 vs 3 of 7 -> 57/43, gap 14 -> golden
        let ei = report.balances[Axis::EI.index()];
        assert_eq!((ei.positive_pct, ei.negative_pct, ei.tone), (57, 43, Tone::Golden));
        let tf = report.balances[Axis::TF.index()];
        assert_eq!(tf.tone, Tone::Leaning);

        let report = analyze(&members(&["ESTJ", "INFP"])).unwrap();
        assert!(report.balances.iter().all(|b| b.tone == Tone::Even));
    }

    #[test]
    fn minorities_are_present_but_under_forty_percent() {
        // I: 1 of 5 (20%), N: 2 of 5 (40%, not a minority), F: 0 (absent, not listed)
        let report = analyze(&members(&["ESTJ", "ESTJ", "ENTJ", "ENTP", "ISTJ"])).unwrap();
        assert_eq!(report.minorities, vec![Pole::I]);
    }
}
