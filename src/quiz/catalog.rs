use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use tokio::sync::OnceCell;

use super::type_code::TypeCode;
use super::{Axis, Pole, Question, QuestionId};

/// The canonical, unshuffled question list. Scoring always walks this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for question in &questions {
            if question.side.axis() != question.axis {
                return Err(CatalogError::SideNotOnAxis {
                    id: question.id,
                    axis: question.axis,
                    side: question.side,
                });
            }
            if !seen.insert(question.id) {
                return Err(CatalogError::DuplicateQuestion(question.id));
            }
        }
        Ok(Self { questions })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let questions: Vec<Question> = serde_json::from_reader(reader)?;
        Self::new(questions)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Largest possible |axis score|: every question on the axis answered at an extreme.
    pub fn axis_limit(&self, axis: Axis) -> i32 {
        let count = self.questions.iter().filter(|q| q.axis == axis).count();
        (count as i32) * 2
    }

    /// Largest possible letter sum: every question on that side rated 5.
    pub fn side_limit(&self, side: Pole) -> u32 {
        let count = self.questions.iter().filter(|q| q.side == side).count();
        (count as u32) * 5
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TypeProfile {
    pub code: TypeCode,
    pub name: String,
    pub summary: String,
    pub strength: String,
    pub weakness: String,
    pub bible_character: String,
    pub bible_character_desc: String,
    pub verse_ref: String,
    pub verse_text: String,
    #[serde(default)]
    pub verse_apply: String,
}

/// Display metadata per type, kept in file order. That order is the tie-break
/// order for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCatalog {
    profiles: Vec<TypeProfile>,
}

impl TypeCatalog {
    pub fn new(profiles: Vec<TypeProfile>) -> Result<Self, CatalogError> {
        if profiles.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for profile in &profiles {
            if !seen.insert(profile.code) {
                return Err(CatalogError::DuplicateType(profile.code));
            }
        }
        Ok(Self { profiles })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let profiles: Vec<TypeProfile> = serde_json::from_reader(reader)?;
        Self::new(profiles)
    }

    pub fn get(&self, code: &TypeCode) -> Option<&TypeProfile> {
        self.profiles.iter().find(|p| p.code == *code)
    }

    /// Codes in catalog order.
    pub fn codes(&self) -> impl Iterator<Item = TypeCode> + '_ {
        self.profiles.iter().map(|p| p.code)
    }

    /// Codes in alphabetical order, for browsing.
    pub fn sorted_codes(&self) -> Vec<TypeCode> {
        let mut codes = self.codes().collect::<Vec<_>>();
        codes.sort_by_key(|code| code.to_string());
        codes
    }
}

/// Both catalogs, filled once after startup. Until then every lookup yields `None`.
#[derive(Debug, Default)]
pub struct Catalogs {
    questions: OnceCell<QuestionCatalog>,
    types: OnceCell<TypeCatalog>,
}

impl Catalogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn questions(&self) -> Option<&QuestionCatalog> {
        self.questions.get()
    }

    pub fn types(&self) -> Option<&TypeCatalog> {
        self.types.get()
    }

    /// Reads both catalog files. Files are small, so this reads them on a blocking thread in one go.
    pub async fn load(
        &self,
        questions_path: impl AsRef<Path>,
        types_path: impl AsRef<Path>,
    ) -> Result<(), CatalogError> {
        let questions_path = questions_path.as_ref().to_path_buf();
        let types_path = types_path.as_ref().to_path_buf();

        let (questions, types) = tokio::task::spawn_blocking(move || {
            let questions = QuestionCatalog::from_reader(std::fs::File::open(&questions_path)?)?;
            let types = TypeCatalog::from_reader(std::fs::File::open(&types_path)?)?;
            Ok::<_, CatalogError>((questions, types))
        })
        .await
        .map_err(|err| CatalogError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))??;

        self.install(questions, types);
        Ok(())
    }

    /// Later calls are ignored: catalogs are immutable once set.
    pub fn install(&self, questions: QuestionCatalog, types: TypeCatalog) {
        if self.questions.set(questions).is_err() || self.types.set(types).is_err() {
            log::warn!("Catalogs were already loaded, keeping the first copy");
        }
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Empty,
    SideNotOnAxis { id: QuestionId, axis: Axis, side: Pole },
    DuplicateQuestion(QuestionId),
    DuplicateType(TypeCode),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Json(err) => write!(f, "json: {err}"),
            Self::Empty => write!(f, "catalog is empty"),
            Self::SideNotOnAxis { id, axis, side } => {
                write!(f, "question {id}: side {side} is not on axis {axis}")
            }
            Self::DuplicateQuestion(id) => write!(f, "question {id} appears twice"),
            Self::DuplicateType(code) => write!(f, "type {code} appears twice"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTIONS: &str = r#"[
        {"id": 1, "text": "I pray out loud with others", "axis": "EI", "side": "E"},
        {"id": 2, "text": "I need quiet before I can pray", "axis": "EI", "side": "I"},
        {"id": 3, "text": "I follow a reading plan", "axis": "JP", "side": "J"}
    ]"#;

    fn profile(code: &str) -> TypeProfile {
        TypeProfile {
            code: code.parse().unwrap(),
            name: format!("{code} name"),
            summary: String::new(),
            strength: String::new(),
            weakness: String::new(),
            bible_character: String::new(),
            bible_character_desc: String::new(),
            verse_ref: String::new(),
            verse_text: String::new(),
            verse_apply: String::new(),
        }
    }

    #[test]
    fn loads_questions_and_limits() {
        let catalog = QuestionCatalog::from_reader(QUESTIONS.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.axis_limit(Axis::EI), 4);
        assert_eq!(catalog.axis_limit(Axis::SN), 0);
        assert_eq!(catalog.side_limit(Pole::J), 5);
        assert_eq!(catalog.questions()[1].side, Pole::I);
    }

    #[test]
    fn rejects_side_off_its_axis() {
        let json = r#"[{"id": 1, "text": "x", "axis": "SN", "side": "E"}]"#;
        let err = QuestionCatalog::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::SideNotOnAxis { axis: Axis::SN, side: Pole::E, .. }));
    }

    #[test]
    fn rejects_duplicate_ids_and_empty_lists() {
        let dup = vec![
            Question::new(1, "a", Pole::E),
            Question::new(1, "b", Pole::I),
        ];
        assert!(matches!(
            QuestionCatalog::new(dup),
            Err(CatalogError::DuplicateQuestion(QuestionId(1)))
        ));
        assert!(matches!(QuestionCatalog::new(Vec::new()), Err(CatalogError::Empty)));
    }

    #[test]
    fn type_catalog_keeps_file_order() {
        let catalog = TypeCatalog::new(vec![profile("INFP"), profile("ESTJ"), profile("ENFJ")]).unwrap();
        let codes = catalog.codes().map(|c| c.to_string()).collect::<Vec<_>>();
        assert_eq!(codes, vec!["INFP", "ESTJ", "ENFJ"]);
        let sorted = catalog.sorted_codes().iter().map(|c| c.to_string()).collect::<Vec<_>>();
        assert_eq!(sorted, vec!["ENFJ", "ESTJ", "INFP"]);
        assert!(catalog.get(&"ISTJ".parse().unwrap()).is_none());
    }

    #[test]
    fn type_catalog_rejects_bad_codes_and_duplicates() {
        let json = r#"[{"code": "XSTJ", "name": "", "summary": "", "strength": "", "weakness": "",
            "bible_character": "", "bible_character_desc": "", "verse_ref": "", "verse_text": ""}]"#;
        assert!(matches!(TypeCatalog::from_reader(json.as_bytes()), Err(CatalogError::Json(_))));
        assert!(matches!(
            TypeCatalog::new(vec![profile("ESTJ"), profile("ESTJ")]),
            Err(CatalogError::DuplicateType(_))
        ));
    }

    #[test]
    fn catalogs_are_empty_until_installed() {
        let catalogs = Catalogs::new();
        assert!(catalogs.questions().is_none());
        assert!(catalogs.types().is_none());

        let questions = QuestionCatalog::from_reader(QUESTIONS.as_bytes()).unwrap();
        let types = TypeCatalog::new(vec![profile("ESTJ")]).unwrap();
        catalogs.install(questions.clone(), types);
        assert_eq!(catalogs.questions(), Some(&questions));
        assert!(catalogs.types().is_some());
    }

    #[tokio::test]
    async fn bundled_data_files_load() {
        let catalogs = Catalogs::new();
        catalogs
            .load("data/questions.json", "data/types.json")
            .await
            .unwrap();
        let questions = catalogs.questions().unwrap();
        for axis in Axis::ALL {
            assert!(questions.axis_limit(axis) > 0);
        }
        assert_eq!(catalogs.types().unwrap().codes().count(), 16);
    }
}
