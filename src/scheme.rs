//! Defines the [`Scheme`] type, which decides how postal codes are bucketed
//! into [`GroupKey`]s (departments in France, postal regions in Finland) and
//! what those groups are called.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The postal-code prefix shared by the locations of one department or
/// region, e.g., `75` or `971`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(key: &str) -> GroupKey {
        GroupKey(key.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the keys one below and one above this one, zero-padded to this
    /// key's width (`01` gives `00` and `02`; `971` gives `970` and `972`).
    /// Keys that aren't numeric have no neighbours, and `0` has no lower
    /// neighbour.
    pub fn neighbours(&self) -> Vec<GroupKey> {
        let value: u64 = match self.0.parse() {
            Ok(value) => value,
            Err(_) => return Vec::new(),
        };
        let width = self.0.len();
        value
            .checked_sub(1)
            .into_iter()
            .chain(value.checked_add(1))
            .map(|n| GroupKey(format!("{:0width$}", n, width = width)))
            .collect()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A range of postal codes whose group key is wider than the scheme's
/// default, e.g., French overseas departments (`971xx` belongs to `971`, not
/// `97`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtendedPrefix {
    pub prefix: String,
    pub width: usize,
}

fn default_width() -> usize {
    2
}

fn default_fallback_label() -> String {
    String::from("Group")
}

/// The immutable lookup tables for one country's postal codes. A scheme is
/// loaded once per run and passed explicitly to whatever needs to resolve
/// group keys or group names.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scheme {
    /// The number of leading characters that make up a group key.
    #[serde(default = "default_width")]
    pub width: usize,

    /// Prefixes which take a wider group key. The first matching entry wins.
    #[serde(default)]
    pub extended: Vec<ExtendedPrefix>,

    /// Display names by group key.
    #[serde(default)]
    pub names: BTreeMap<String, String>,

    /// Prepended to the key for groups with no entry in `names`.
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
}

const FRENCH_DEPARTMENTS: &[(&str, &str)] = &[
    ("01", "Ain"),
    ("02", "Aisne"),
    ("03", "Allier"),
    ("04", "Alpes-de-Haute-Provence"),
    ("05", "Hautes-Alpes"),
    ("06", "Alpes-Maritimes"),
    ("07", "Ardèche"),
    ("08", "Ardennes"),
    ("09", "Ariège"),
    ("10", "Aube"),
    ("11", "Aude"),
    ("12", "Aveyron"),
    ("13", "Bouches-du-Rhône"),
    ("14", "Calvados"),
    ("15", "Cantal"),
    ("16", "Charente"),
    ("17", "Charente-Maritime"),
    ("18", "Cher"),
    ("19", "Corrèze"),
    ("2A", "Corse-du-Sud"),
    ("2B", "Haute-Corse"),
    ("21", "Côte-d'Or"),
    ("22", "Côtes-d'Armor"),
    ("23", "Creuse"),
    ("24", "Dordogne"),
    ("25", "Doubs"),
    ("26", "Drôme"),
    ("27", "Eure"),
    ("28", "Eure-et-Loir"),
    ("29", "Finistère"),
    ("30", "Gard"),
    ("31", "Haute-Garonne"),
    ("32", "Gers"),
    ("33", "Gironde"),
    ("34", "Hérault"),
    ("35", "Ille-et-Vilaine"),
    ("36", "Indre"),
    ("37", "Indre-et-Loire"),
    ("38", "Isère"),
    ("39", "Jura"),
    ("40", "Landes"),
    ("41", "Loir-et-Cher"),
    ("42", "Loire"),
    ("43", "Haute-Loire"),
    ("44", "Loire-Atlantique"),
    ("45", "Loiret"),
    ("46", "Lot"),
    ("47", "Lot-et-Garonne"),
    ("48", "Lozère"),
    ("49", "Maine-et-Loire"),
    ("50", "Manche"),
    ("51", "Marne"),
    ("52", "Haute-Marne"),
    ("53", "Mayenne"),
    ("54", "Meurthe-et-Moselle"),
    ("55", "Meuse"),
    ("56", "Morbihan"),
    ("57", "Moselle"),
    ("58", "Nièvre"),
    ("59", "Nord"),
    ("60", "Oise"),
    ("61", "Orne"),
    ("62", "Pas-de-Calais"),
    ("63", "Puy-de-Dôme"),
    ("64", "Pyrénées-Atlantiques"),
    ("65", "Hautes-Pyrénées"),
    ("66", "Pyrénées-Orientales"),
    ("67", "Bas-Rhin"),
    ("68", "Haut-Rhin"),
    ("69", "Rhône"),
    ("70", "Haute-Saône"),
    ("71", "Saône-et-Loire"),
    ("72", "Sarthe"),
    ("73", "Savoie"),
    ("74", "Haute-Savoie"),
    ("75", "Paris"),
    ("76", "Seine-Maritime"),
    ("77", "Seine-et-Marne"),
    ("78", "Yvelines"),
    ("79", "Deux-Sèvres"),
    ("80", "Somme"),
    ("81", "Tarn"),
    ("82", "Tarn-et-Garonne"),
    ("83", "Var"),
    ("84", "Vaucluse"),
    ("85", "Vendée"),
    ("86", "Vienne"),
    ("87", "Haute-Vienne"),
    ("88", "Vosges"),
    ("89", "Yonne"),
    ("90", "Territoire de Belfort"),
    ("91", "Essonne"),
    ("92", "Hauts-de-Seine"),
    ("93", "Seine-Saint-Denis"),
    ("94", "Val-de-Marne"),
    ("95", "Val-d'Oise"),
    ("971", "Guadeloupe"),
    ("972", "Martinique"),
    ("973", "Guyane"),
    ("974", "La Réunion"),
    ("976", "Mayotte"),
];

impl Scheme {
    /// French departments: two-digit keys, except for overseas departments
    /// (`97x`) which take three.
    pub fn french() -> Scheme {
        Scheme {
            width: 2,
            extended: vec![ExtendedPrefix {
                prefix: String::from("97"),
                width: 3,
            }],
            names: FRENCH_DEPARTMENTS
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
            fallback_label: String::from("Département"),
        }
    }

    /// Finnish postal regions: plain two-digit keys.
    pub fn finnish() -> Scheme {
        Scheme {
            width: 2,
            extended: Vec::new(),
            names: BTreeMap::new(),
            fallback_label: String::from("Alue"),
        }
    }

    /// Looks up a built-in scheme by name.
    pub fn builtin(name: &str) -> Option<Scheme> {
        match name {
            "french" | "fr" => Some(Scheme::french()),
            "finnish" | "fi" => Some(Scheme::finnish()),
            _ => None,
        }
    }

    /// Loads a scheme from a YAML file.
    pub fn from_file(path: &Path) -> Result<Scheme> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Derives the group key for a postal code. Codes shorter than the key
    /// width yield the whole code. Widths count characters, not bytes.
    pub fn group_key(&self, postal_code: &str) -> GroupKey {
        let width = self
            .extended
            .iter()
            .find(|ext| postal_code.starts_with(&ext.prefix))
            .map_or(self.width, |ext| ext.width);
        GroupKey(postal_code.chars().take(width).collect())
    }

    /// Returns the display name for a group, e.g., `Paris` for `75`. Unknown
    /// groups are named `{fallback_label} {key}`.
    pub fn group_name(&self, key: &GroupKey) -> String {
        match self.names.get(key.as_str()) {
            Some(name) => name.clone(),
            None => format!("{} {}", self.fallback_label, key),
        }
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::french()
    }
}

/// The result of a fallible scheme-loading operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Scheme`] from disk.
#[derive(Debug)]
pub enum Error {
    /// Returned when the scheme file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the scheme file isn't valid YAML or doesn't match the
    /// expected shape.
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening scheme file '{}': {}", path.display(), err)
            }
            Error::DeserializeYaml(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}
