use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    School,
    System,
    Grading,
    Preferences,
    Profile,
}

impl SettingsSection {
    pub const ALL: [SettingsSection; 5] = [
        SettingsSection::School,
        SettingsSection::System,
        SettingsSection::Grading,
        SettingsSection::Preferences,
        SettingsSection::Profile,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "school" => Some(Self::School),
            "system" => Some(Self::System),
            "grading" => Some(Self::Grading),
            "preferences" => Some(Self::Preferences),
            "profile" => Some(Self::Profile),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::School => "school",
            Self::System => "system",
            Self::Grading => "grading",
            Self::Preferences => "preferences",
            Self::Profile => "profile",
        }
    }
}

fn default_section(section: SettingsSection) -> Value {
    match section {
        SettingsSection::School => json!({
            "name": "Meghis Senior High School",
            "address": "P.O. Box 123, Accra, Ghana",
            "phone": "+233 30 123 4567",
            "email": "info@meghis.edu.gh",
            "website": "www.meghis.edu.gh",
            "currentTerm": "2023/2024 - Semester 2",
            "termStartDate": "2024-01-15",
            "termEndDate": "2024-06-15"
        }),
        SettingsSection::System => json!({
            "maintenanceMode": false,
            "studentSelfRegistration": false,
            "emailNotifications": true,
            "smsNotifications": false
        }),
        SettingsSection::Grading => json!({
            "passMark": 50,
            "topPerformerMin": 80,
            "atRiskBelow": 50
        }),
        SettingsSection::Preferences => json!({
            "darkMode": false,
            "fontSize": "medium",
            "language": "english",
            "emailNotifications": true,
            "smsNotifications": false,
            "twoFactorEnabled": false
        }),
        SettingsSection::Profile => json!({
            "name": "Dr. Patricia Mensah",
            "email": "patricia.mensah@meghis.edu.gh",
            "phone": "+233 20 123 4567"
        }),
    }
}

/// What a single settings key accepts.
#[derive(Debug, Clone, Copy)]
enum FieldRule {
    Flag,
    Percent,
    Text { max_len: usize, required: bool },
    Date,
    Email,
    Choice(&'static [&'static str]),
}

fn field_rule(section: SettingsSection, key: &str) -> Option<FieldRule> {
    use FieldRule::*;
    let rule = match (section, key) {
        (SettingsSection::School, "name" | "currentTerm") => Text { max_len: 120, required: true },
        (SettingsSection::School, "address" | "phone" | "email" | "website") => {
            Text { max_len: 200, required: false }
        }
        (SettingsSection::School, "termStartDate" | "termEndDate") => Date,
        (
            SettingsSection::System,
            "maintenanceMode" | "studentSelfRegistration" | "emailNotifications" | "smsNotifications",
        ) => Flag,
        (SettingsSection::Grading, "passMark" | "topPerformerMin" | "atRiskBelow") => Percent,
        (
            SettingsSection::Preferences,
            "darkMode" | "emailNotifications" | "smsNotifications" | "twoFactorEnabled",
        ) => Flag,
        (SettingsSection::Preferences, "fontSize") => Choice(&["small", "medium", "large"]),
        (SettingsSection::Preferences, "language") => Choice(&["english", "french", "twi"]),
        (SettingsSection::Profile, "name") => Text { max_len: 120, required: true },
        (SettingsSection::Profile, "email") => Email,
        (SettingsSection::Profile, "phone") => Text { max_len: 40, required: false },
        _ => return None,
    };
    Some(rule)
}

impl FieldRule {
    fn check(self, key: &str, v: &Value) -> Result<Value, String> {
        let text = |max_len: usize| -> Result<String, String> {
            let s = v
                .as_str()
                .map(str::trim)
                .ok_or_else(|| format!("{key} expects text"))?;
            if s.len() > max_len {
                return Err(format!("{key} is longer than {max_len} characters"));
            }
            Ok(s.to_string())
        };
        match self {
            FieldRule::Flag => v
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| format!("{key} expects true or false")),
            FieldRule::Percent => match v.as_i64() {
                Some(n) if (0..=100).contains(&n) => Ok(Value::from(n)),
                _ => Err(format!("{key} expects a whole number from 0 to 100")),
            },
            FieldRule::Text { max_len, required } => {
                let s = text(max_len)?;
                if required && s.is_empty() {
                    return Err(format!("{key} cannot be blank"));
                }
                Ok(Value::String(s))
            }
            FieldRule::Date => {
                let s = text(10)?;
                chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|_| format!("{key} expects a YYYY-MM-DD date"))?;
                Ok(Value::String(s))
            }
            FieldRule::Email => {
                let s = text(200)?;
                if !s.contains('@') {
                    return Err(format!("{key} expects an email address"));
                }
                Ok(Value::String(s))
            }
            FieldRule::Choice(allowed) => {
                let s = text(24)?.to_ascii_lowercase();
                if !allowed.contains(&s.as_str()) {
                    return Err(format!("{key} expects one of {}", allowed.join("/")));
                }
                Ok(Value::String(s))
            }
        }
    }
}

fn merge_section_patch(
    section: SettingsSection,
    current: &mut Map<String, Value>,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    // Validate into a scratch copy so a bad key leaves the section untouched.
    let mut next = current.clone();
    for (k, v) in patch {
        let rule = field_rule(section, k)
            .ok_or_else(|| format!("unknown {} field: {k}", section.key()))?;
        let value = rule.check(k, v)?;
        next.insert(k.clone(), value);
    }

    if section == SettingsSection::School {
        let start = next.get("termStartDate").and_then(Value::as_str).unwrap_or("");
        let end = next.get("termEndDate").and_then(Value::as_str).unwrap_or("");
        if !start.is_empty() && !end.is_empty() && start > end {
            return Err("termStartDate must not be after termEndDate".into());
        }
    }

    *current = next;
    Ok(())
}

/// Sectioned runtime settings with defaults; patches are validated per key.
#[derive(Debug, Clone)]
pub struct Settings {
    sections: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut sections = Map::new();
        for s in SettingsSection::ALL {
            sections.insert(s.key().to_string(), default_section(s));
        }
        Self { sections }
    }
}

impl Settings {
    pub fn section(&self, section: SettingsSection) -> Value {
        self.sections
            .get(section.key())
            .cloned()
            .unwrap_or_else(|| default_section(section))
    }

    pub fn all(&self) -> Value {
        Value::Object(self.sections.clone())
    }

    pub fn update(&mut self, section: SettingsSection, patch: &Map<String, Value>) -> Result<(), String> {
        let entry = self
            .sections
            .entry(section.key().to_string())
            .or_insert_with(|| default_section(section));
        let Some(obj) = entry.as_object_mut() else {
            return Err("internal settings section must be a JSON object".into());
        };
        merge_section_patch(section, obj, patch)
    }

    fn str_field(&self, section: SettingsSection, key: &str) -> String {
        self.section(section)
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                default_section(section)
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_default()
    }

    fn num_field(&self, section: SettingsSection, key: &str) -> f64 {
        self.section(section)
            .get(key)
            .and_then(Value::as_f64)
            .or_else(|| default_section(section).get(key).and_then(Value::as_f64))
            .unwrap_or(0.0)
    }

    pub fn current_term(&self) -> String {
        self.str_field(SettingsSection::School, "currentTerm")
    }

    pub fn school_name(&self) -> String {
        self.str_field(SettingsSection::School, "name")
    }

    pub fn pass_mark(&self) -> f64 {
        self.num_field(SettingsSection::Grading, "passMark")
    }

    pub fn top_performer_min(&self) -> f64 {
        self.num_field(SettingsSection::Grading, "topPerformerMin")
    }

    pub fn at_risk_below(&self) -> f64 {
        self.num_field(SettingsSection::Grading, "atRiskBelow")
    }
}
