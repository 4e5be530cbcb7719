use crate::error::Error;

/// An ordered (keyword, destination label) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub keyword: String,
    pub label: String,
}

impl Rule {
    pub fn new(keyword: &str, label: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            label: label.to_string(),
        }
    }

    /// Case-insensitive substring match against a file name.
    pub fn matches(&self, file_name: &str) -> bool {
        file_name
            .to_lowercase()
            .contains(&self.keyword.to_lowercase())
    }
}

/// Rules in priority order. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

const STANDARD_RULES: &[(&str, &str)] = &[
    ("CK_SBC", "Chinook_Southern_BC_CU"),
    ("CK_CU", "Chinook_Salmon_CU"),
    ("CM_CU", "Chum_Salmon_CU"),
    ("CO_CU", "Coho_Salmon_CU"),
    ("PKE_CU", "Pink_Salmon_Even_CU"),
    ("PKO_CU", "Pink_Salmon_Odd_CU"),
    ("SEL_CU", "Sockeye_Lake_CU"),
    ("SER_CU", "Sockeye_River_CU"),
];

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The keyword table matching the file stems written by the extraction catalog.
    pub fn standard() -> Self {
        Self::new(
            STANDARD_RULES
                .iter()
                .map(|(keyword, label)| Rule::new(keyword, label))
                .collect(),
        )
    }

    /// Build from configured pairs, rejecting blank keywords or labels.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut rules = Vec::new();
        for (position, (keyword, label)) in pairs.into_iter().enumerate() {
            let keyword = keyword.trim();
            let label = label.trim();
            if keyword.is_empty() || label.is_empty() {
                return Err(Error::Other(format!(
                    "Rule {} must have a non-empty keyword and label",
                    position + 1
                )));
            }
            rules.push(Rule::new(keyword, label));
        }
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn classify(&self, file_name: &str) -> Option<&str> {
        classify(file_name, &self.rules)
    }

    /// Pairs of (earlier, later) rules where the later one can never win
    /// because the earlier keyword is contained in it.
    pub fn shadowed(&self) -> Vec<(&Rule, &Rule)> {
        let mut result = Vec::new();
        for (i, later) in self.rules.iter().enumerate() {
            let earlier = self.rules[..i]
                .iter()
                .find(|earlier| earlier.matches(&later.keyword));
            if let Some(earlier) = earlier {
                result.push((earlier, later));
            }
        }
        result
    }
}

/// Label of the first rule, in declared order, whose keyword occurs in
/// `file_name` ignoring case.
pub fn classify<'a>(file_name: &str, rules: &'a [Rule]) -> Option<&'a str> {
    let lowered = file_name.to_lowercase();
    rules
        .iter()
        .find(|rule| lowered.contains(&rule.keyword.to_lowercase()))
        .map(|rule| rule.label.as_str())
}
