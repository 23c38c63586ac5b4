use super::type_code::TypeCode;
use super::Axis;

const CLOSEST_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TypeMatch {
    pub code: TypeCode,
    pub similarity: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchResult {
    /// Up to two most similar types, most similar first.
    pub closest: Vec<TypeMatch>,
    /// The least similar type. `None` only when the catalog holds no other type.
    pub opposite: Option<TypeMatch>,
}

/// Number of axes on which both codes pick the same pole.
pub fn similarity(a: &TypeCode, b: &TypeCode) -> usize {
    Axis::ALL
        .into_iter()
        .filter(|&axis| a.pole(axis) == b.pole(axis))
        .count()
}

/// Ranks every catalog entry other than `target` by similarity.
///
/// Ties keep catalog order: the sorts are stable, so the entry seen first wins.
pub fn find_matches<I>(target: &TypeCode, catalog: I) -> MatchResult
where
    I: IntoIterator<Item = TypeCode>,
{
    let candidates = catalog
        .into_iter()
        .filter(|code| code != target)
        .map(|code| TypeMatch {
            code,
            similarity: similarity(target, &code),
        })
        .collect::<Vec<_>>();

    let mut by_closeness = candidates.clone();
    by_closeness.sort_by(|a, b| b.similarity.cmp(&a.similarity));
    by_closeness.truncate(CLOSEST_COUNT);

    let opposite = candidates.into_iter().min_by_key(|m| m.similarity);

    MatchResult {
        closest: by_closeness,
        opposite,
    }
}
