use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier a mod declares in its manifest (`modid`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModId(pub String);

impl ModId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque version string. Carried for display only, never compared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModVersion(pub String);

impl fmt::Display for ModVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One mod as seen by the search: identity, declared dependencies and the
/// archive it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub id: ModId,
    pub name: String,
    pub version: ModVersion,
    pub dependencies: BTreeMap<ModId, ModVersion>,
    /// Archive file name inside the mods directory.
    pub source: String,
}

impl PluginDescriptor {
    /// `- archive.zip (Display Name)`
    pub fn listing_line(&self) -> String {
        format!("- {} ({})", self.source, self.name)
    }
}

#[cfg(test)]
impl PluginDescriptor {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        let id = ModId::new(id);
        Self {
            name: id.0.clone(),
            id,
            version: ModVersion::default(),
            dependencies: BTreeMap::new(),
            source: source.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>, version: impl Into<String>) -> Self {
        self.dependencies
            .insert(ModId::new(id), ModVersion(version.into()));
        self
    }
}

/// A maximal set of mods tied together by dependencies. The search parks or
/// restores a component as a whole, never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    members: Vec<PluginDescriptor>,
}

impl Component {
    /// `members` must already be in display order.
    pub fn new(members: Vec<PluginDescriptor>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[PluginDescriptor] {
        &self.members
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModId> {
        self.members.iter().map(|member| &member.id)
    }

    pub fn locators(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|member| member.source.as_str())
    }

    /// Smallest mod ID in the component, used as a stable tie-break key.
    pub fn min_id(&self) -> Option<&ModId> {
        self.ids().min()
    }
}

/// Flattens components into the archive names the activation layer moves.
pub fn locators_of(components: &[Component]) -> Vec<String> {
    components
        .iter()
        .flat_map(|component| component.locators().map(str::to_string))
        .collect()
}

pub fn plugin_count(components: &[Component]) -> usize {
    components.iter().map(Component::len).sum()
}
