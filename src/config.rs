use std::collections::HashSet;

/// Immutable settings shared by every worker for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct Config {
    pub empty_field: String,
    pub field_delimiter: String,
    pub keep_id: bool,
    pub keep_qual: bool,
    pub keep_pos: bool,
    pub keep_info: bool,
    pub filters: FilterSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            empty_field: "!".to_string(),
            field_delimiter: ";".to_string(),
            keep_id: false,
            keep_qual: false,
            keep_pos: false,
            keep_info: false,
            filters: FilterSet::new(Some(parse_filter_list("PASS,.")), None),
        }
    }
}

/// FILTER column allow/deny lists. `None` allows all / denies none.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    allow: Option<HashSet<String>>,
    deny: Option<HashSet<String>>,
}

impl FilterSet {
    pub fn new(allow: Option<HashSet<String>>, deny: Option<HashSet<String>>) -> Self {
        Self { allow, deny }
    }

    pub fn passes(&self, filter: &str) -> bool {
        if let Some(allow) = &self.allow
            && !allow.contains(filter)
        {
            return false;
        }
        match &self.deny {
            Some(deny) => !deny.contains(filter),
            None => true,
        }
    }
}

/// Parses a comma-separated list. An empty list yields an empty set.
pub fn parse_filter_list(list: &str) -> HashSet<String> {
    list.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
