//! Cargo manifest model for the parts of `Cargo.toml` the tasks edit.
//!
//! Recognized sections (`package`, `workspace`, `dependencies`, `bin`) get
//! typed views. Everything else, including unknown keys inside recognized
//! sections, is carried through untouched so that reading and writing a
//! manifest preserves its key/value content. Comments and formatting are
//! not preserved.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::{Error, Result};
use crate::utils::io;

/// Splits a section table into known fields and leftovers.
///
/// Known keys are removed one at a time with a type check; whatever is left
/// at the end becomes the section's `unhandled` table.
struct SectionFields<'a> {
    section: &'a str,
    source: Option<&'a Path>,
    table: Table,
}

impl<'a> SectionFields<'a> {
    fn new(section: &'a str, value: &Value, source: Option<&'a Path>) -> Result<Self> {
        let table = value.as_table().cloned().ok_or_else(|| {
            shape_error(
                section,
                format!("expected a table, found {}", value.type_str()),
                source,
            )
        })?;
        Ok(Self {
            section,
            source,
            table,
        })
    }

    fn field(&self, key: &str) -> String {
        format!("{}.{}", self.section, key)
    }

    fn take_string(&mut self, key: &str) -> Result<Option<String>> {
        match self.table.remove(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(shape_error(
                &self.field(key),
                format!("expected a string, found {}", other.type_str()),
                self.source,
            )),
        }
    }

    fn require_string(&mut self, key: &str) -> Result<String> {
        self.take_string(key)?
            .ok_or_else(|| Error::manifest_missing_field(self.field(key), display(self.source)))
    }

    fn take_string_array(&mut self, key: &str) -> Result<Option<Vec<String>>> {
        let Some(value) = self.table.remove(key) else {
            return Ok(None);
        };
        let Value::Array(items) = value else {
            return Err(shape_error(
                &self.field(key),
                format!("expected an array, found {}", value.type_str()),
                self.source,
            ));
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(shape_error(
                    &self.field(key),
                    format!("expected an array of strings, found {}", other.type_str()),
                    self.source,
                )),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn take_value(&mut self, key: &str) -> Option<Value> {
        self.table.remove(key)
    }

    fn into_unhandled(self) -> Table {
        self.table
    }
}

fn display(source: Option<&Path>) -> Option<String> {
    source.map(|p| p.display().to_string())
}

fn shape_error(field: &str, problem: String, source: Option<&Path>) -> Error {
    Error::manifest_invalid_shape(field, problem, display(source))
}

/// A `[[bin]]` target. Only `name` and `path` are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bin {
    pub name: String,
    pub path: String,
}

impl Bin {
    fn from_value(value: &Value, index: usize, source: Option<&Path>) -> Result<Self> {
        let section = format!("bin[{}]", index);
        let mut fields = SectionFields::new(&section, value, source)?;
        let name = fields.require_string("name")?;
        let path = fields.require_string("path")?;

        let unexpected = fields.into_unhandled();
        if !unexpected.is_empty() {
            let keys: Vec<&str> = unexpected.keys().map(String::as_str).collect();
            return Err(shape_error(
                &section,
                format!("unexpected keys: {}", keys.join(", ")),
                source,
            ));
        }

        Ok(Self { name, path })
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.insert("name".to_string(), Value::String(self.name.clone()));
        table.insert("path".to_string(), Value::String(self.path.clone()));
        table
    }
}

/// The `[package]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub version: Option<String>,
    pub edition: Option<String>,
    pub unhandled: Table,
}

impl Package {
    pub fn from_value(value: &Value, source: Option<&Path>) -> Result<Self> {
        let mut fields = SectionFields::new("package", value, source)?;
        let name = fields.require_string("name")?;
        let version = fields.take_string("version")?;
        let edition = fields.take_string("edition")?;
        Ok(Self {
            name,
            version,
            edition,
            unhandled: fields.into_unhandled(),
        })
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(version) = &self.version {
            table.insert("version".to_string(), Value::String(version.clone()));
        }
        if let Some(edition) = &self.edition {
            table.insert("edition".to_string(), Value::String(edition.clone()));
        }
        table.extend(self.unhandled.clone());
        table
    }
}

/// The `[workspace.package]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspacePackage {
    pub version: String,
    pub unhandled: Table,
}

impl WorkspacePackage {
    pub fn from_value(value: &Value, source: Option<&Path>) -> Result<Self> {
        let mut fields = SectionFields::new("workspace.package", value, source)?;
        let version = fields.require_string("version")?;
        Ok(Self {
            version,
            unhandled: fields.into_unhandled(),
        })
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.insert("version".to_string(), Value::String(self.version.clone()));
        table.extend(self.unhandled.clone());
        table
    }
}

/// The `[workspace]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub package: Option<WorkspacePackage>,
    pub members: Option<Vec<String>>,
    pub unhandled: Table,
}

impl Workspace {
    pub fn from_value(value: &Value, source: Option<&Path>) -> Result<Self> {
        let mut fields = SectionFields::new("workspace", value, source)?;
        let package = fields
            .take_value("package")
            .map(|v| WorkspacePackage::from_value(&v, source))
            .transpose()?;
        let members = fields.take_string_array("members")?;
        Ok(Self {
            package,
            members,
            unhandled: fields.into_unhandled(),
        })
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        if let Some(package) = &self.package {
            table.insert("package".to_string(), Value::Table(package.to_table()));
        }
        if let Some(members) = &self.members {
            let members = members.iter().cloned().map(Value::String).collect();
            table.insert("members".to_string(), Value::Array(members));
        }
        table.extend(self.unhandled.clone());
        table
    }
}

/// View of one dependency specification.
#[derive(Debug)]
pub enum DependencySpec<'a> {
    /// `foo = "1.0"`
    Simple(&'a str),
    /// `foo = { path = "../foo", features = [...] }`
    Detailed(&'a mut Table),
}

impl<'a> DependencySpec<'a> {
    /// Classify a raw value. Anything other than a string or table yields `None`.
    pub fn from_value(value: &'a mut Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(DependencySpec::Simple(s.as_str())),
            Value::Table(t) => Some(DependencySpec::Detailed(t)),
            _ => None,
        }
    }
}

/// The `[dependencies]` table, kept opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependencies {
    pub data: Table,
}

impl Dependencies {
    pub fn from_value(value: &Value, source: Option<&Path>) -> Result<Self> {
        let data = value.as_table().cloned().ok_or_else(|| {
            shape_error(
                "dependencies",
                format!("expected a table, found {}", value.type_str()),
                source,
            )
        })?;
        Ok(Self { data })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Iterate dependencies as typed views, skipping values of unexpected type.
    pub fn specs_mut(&mut self) -> impl Iterator<Item = (&str, DependencySpec<'_>)> {
        self.data
            .iter_mut()
            .filter_map(|(name, value)| DependencySpec::from_value(value).map(|spec| (name.as_str(), spec)))
    }
}

/// A parsed `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct CargoManifest {
    path: PathBuf,
    data: Table,
    pub package: Option<Package>,
    pub workspace: Option<Workspace>,
    pub dependencies: Option<Dependencies>,
    pub bin: Vec<Bin>,
}

impl CargoManifest {
    /// Load a manifest from disk. Fails unless it has a `package` or a `workspace`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = io::read_file(path, "read Cargo manifest")?;
        let data: Table = toml::from_str(&content)
            .map_err(|e| Error::manifest_invalid_toml(path.display().to_string(), e))?;

        let manifest = Self::of(path, data)?;
        if manifest.package.is_none() && manifest.workspace.is_none() {
            return Err(Error::manifest_invalid(
                path.display().to_string(),
                "manifest has neither a [package] nor a [workspace] section",
            ));
        }
        Ok(manifest)
    }

    /// Build a manifest from an already decoded table.
    ///
    /// Unlike [`CargoManifest::read`], a table without `package` and
    /// `workspace` is accepted.
    pub fn of(path: impl Into<PathBuf>, data: Table) -> Result<Self> {
        let path = path.into();
        let source = Some(path.as_path());

        let package = data
            .get("package")
            .map(|v| Package::from_value(v, source))
            .transpose()?;
        let workspace = data
            .get("workspace")
            .map(|v| Workspace::from_value(v, source))
            .transpose()?;
        let dependencies = data
            .get("dependencies")
            .map(|v| Dependencies::from_value(v, source))
            .transpose()?;
        let bin = match data.get("bin") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| Bin::from_value(item, index, source))
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(shape_error(
                    "bin",
                    format!("expected an array of tables, found {}", other.type_str()),
                    source,
                ))
            }
        };

        Ok(Self {
            path,
            data,
            package,
            workspace,
            dependencies,
            bin,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render back to a table: the original with recognized sections replaced.
    pub fn to_table(&self) -> Table {
        let mut result = self.data.clone();

        if self.bin.is_empty() {
            result.remove("bin");
        } else {
            let bins = self.bin.iter().map(|b| Value::Table(b.to_table())).collect();
            result.insert("bin".to_string(), Value::Array(bins));
        }
        if let Some(package) = &self.package {
            result.insert("package".to_string(), Value::Table(package.to_table()));
        }
        if let Some(workspace) = &self.workspace {
            result.insert("workspace".to_string(), Value::Table(workspace.to_table()));
        }
        if let Some(dependencies) = &self.dependencies {
            result.insert(
                "dependencies".to_string(),
                Value::Table(dependencies.data.clone()),
            );
        }

        result
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(&self.to_table()).map_err(|e| {
            Error::internal_unexpected(format!(
                "Failed to encode {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Write the manifest to `path`, or back to where it was read from.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let target = path.unwrap_or(&self.path);
        let content = self.to_toml_string()?;
        io::write_file_atomic(target, &content, "write Cargo manifest")
    }

    /// Paths of the member manifests matched by `workspace.members`.
    ///
    /// Patterns are resolved relative to this manifest's directory; matches
    /// without a `Cargo.toml` are skipped.
    pub fn member_manifests(&self) -> Result<Vec<PathBuf>> {
        let Some(members) = self.workspace.as_ref().and_then(|w| w.members.as_ref()) else {
            return Ok(Vec::new());
        };
        let root = self.path.parent().unwrap_or_else(|| Path::new("."));

        let mut found = BTreeSet::new();
        for member in members {
            let pattern = root.join(member).join("Cargo.toml");
            let pattern = pattern.to_string_lossy();
            let entries = glob::glob(&pattern).map_err(|e| {
                Error::manifest_invalid_shape(
                    "workspace.members",
                    format!("invalid glob pattern '{}': {}", member, e),
                    display(Some(&self.path)),
                )
            })?;
            found.extend(entries.filter_map(|entry| entry.ok()).filter(|p| p.is_file()));
        }

        Ok(found.into_iter().collect())
    }
}
