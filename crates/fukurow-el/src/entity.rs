//! エンティティ管理
//!
//! Every class, object property and individual is addressed by a dense
//! integer id. The manager hands out ids for named entities, mints the
//! auxiliary classes and properties introduced by normalization and role
//! saturation, and keeps the nominal and inverse-property correspondences.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const OWL_NOTHING: &str = "http://www.w3.org/2002/07/owl#Nothing";
pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OWL_BOTTOM_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#bottomObjectProperty";
pub const OWL_TOP_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#topObjectProperty";

/// Class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

impl ClassId {
    /// owl:Nothing
    pub const BOTTOM: ClassId = ClassId(0);
    /// owl:Thing
    pub const TOP: ClassId = ClassId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object property identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub u32);

impl PropertyId {
    /// owl:bottomObjectProperty
    pub const BOTTOM: PropertyId = PropertyId(0);
    /// owl:topObjectProperty
    pub const TOP: PropertyId = PropertyId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Individual identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualId(pub u32);

impl IndividualId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Any identifier issued by [`EntityManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Entity {
    Class(ClassId),
    Property(PropertyId),
    Individual(IndividualId),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Class(id) => write!(f, "class {}", id),
            Entity::Property(id) => write!(f, "property {}", id),
            Entity::Individual(id) => write!(f, "individual {}", id),
        }
    }
}

impl From<ClassId> for Entity {
    fn from(id: ClassId) -> Self {
        Entity::Class(id)
    }
}

impl From<PropertyId> for Entity {
    fn from(id: PropertyId) -> Self {
        Entity::Property(id)
    }
}

impl From<IndividualId> for Entity {
    fn from(id: IndividualId) -> Self {
        Entity::Individual(id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntityRecord {
    name: String,
    auxiliary: bool,
}

impl EntityRecord {
    fn named(name: &str) -> Self {
        Self { name: name.to_string(), auxiliary: false }
    }

    fn auxiliary(name: String) -> Self {
        Self { name, auxiliary: true }
    }
}

fn next_id(len: usize) -> u32 {
    assert!(len < u32::MAX as usize, "entity id space exhausted");
    len as u32
}

/// Issues and tracks entity identifiers.
///
/// Ids are dense and never reused. Passing an id the manager did not issue
/// to any method that needs its record panics; the classifier checks its
/// input with [`EntityManager::contains`] before touching the manager.
#[derive(Debug, Clone)]
pub struct EntityManager {
    classes: Vec<EntityRecord>,
    properties: Vec<EntityRecord>,
    individuals: Vec<EntityRecord>,
    class_names: FxHashMap<String, ClassId>,
    property_names: FxHashMap<String, PropertyId>,
    individual_names: FxHashMap<String, IndividualId>,
    nominal_classes: FxHashMap<IndividualId, ClassId>,
    nominal_individuals: FxHashMap<ClassId, IndividualId>,
    inverses: FxHashMap<PropertyId, PropertyId>,
}

impl EntityManager {
    pub fn new() -> Self {
        let mut manager = Self {
            classes: Vec::new(),
            properties: Vec::new(),
            individuals: Vec::new(),
            class_names: FxHashMap::default(),
            property_names: FxHashMap::default(),
            individual_names: FxHashMap::default(),
            nominal_classes: FxHashMap::default(),
            nominal_individuals: FxHashMap::default(),
            inverses: FxHashMap::default(),
        };

        // 予約済み ID: ⊥ = 0, ⊤ = 1
        manager.class(OWL_NOTHING);
        manager.class(OWL_THING);
        manager.property(OWL_BOTTOM_OBJECT_PROPERTY);
        manager.property(OWL_TOP_OBJECT_PROPERTY);
        manager
    }

    /// Id of the named class `name`, registering it on first use
    pub fn class(&mut self, name: &str) -> ClassId {
        if let Some(&id) = self.class_names.get(name) {
            return id;
        }
        let id = ClassId(next_id(self.classes.len()));
        self.classes.push(EntityRecord::named(name));
        self.class_names.insert(name.to_string(), id);
        id
    }

    /// Id of the named object property `name`, registering it on first use
    pub fn property(&mut self, name: &str) -> PropertyId {
        if let Some(&id) = self.property_names.get(name) {
            return id;
        }
        let id = PropertyId(next_id(self.properties.len()));
        self.properties.push(EntityRecord::named(name));
        self.property_names.insert(name.to_string(), id);
        id
    }

    /// Id of the named individual `name`, registering it on first use
    pub fn individual(&mut self, name: &str) -> IndividualId {
        if let Some(&id) = self.individual_names.get(name) {
            return id;
        }
        let id = IndividualId(next_id(self.individuals.len()));
        self.individuals.push(EntityRecord::named(name));
        self.individual_names.insert(name.to_string(), id);
        id
    }

    /// Mint a fresh auxiliary class
    pub fn new_class_id(&mut self) -> ClassId {
        let id = ClassId(next_id(self.classes.len()));
        self.classes.push(EntityRecord::auxiliary(format!("_:class{}", id.0)));
        id
    }

    /// Mint a fresh auxiliary object property
    pub fn new_property_id(&mut self) -> PropertyId {
        let id = PropertyId(next_id(self.properties.len()));
        self.properties.push(EntityRecord::auxiliary(format!("_:property{}", id.0)));
        id
    }

    /// The auxiliary class standing for the nominal `{individual}`.
    ///
    /// Repeated calls for the same individual return the same class.
    pub fn class_id_for_individual(&mut self, individual: IndividualId) -> ClassId {
        if let Some(&class) = self.nominal_classes.get(&individual) {
            return class;
        }
        let name = format!("{{{}}}", self.individual_record(individual).name);
        let class = ClassId(next_id(self.classes.len()));
        self.classes.push(EntityRecord::auxiliary(name));
        self.nominal_classes.insert(individual, class);
        self.nominal_individuals.insert(class, individual);
        class
    }

    /// The individual a nominal class was minted for
    pub fn individual_for_nominal(&self, class: ClassId) -> Option<IndividualId> {
        self.nominal_individuals.get(&class).copied()
    }

    /// All `(individual, nominal class)` pairs minted so far
    pub fn nominals(&self) -> impl Iterator<Item = (IndividualId, ClassId)> + '_ {
        self.nominal_classes.iter().map(|(&individual, &class)| (individual, class))
    }

    /// The property standing for the inverse of `property`, minted on first use.
    ///
    /// `inverse_of(inverse_of(r)) == r`. The top and bottom properties are
    /// their own inverses.
    pub fn inverse_of(&mut self, property: PropertyId) -> PropertyId {
        if property == PropertyId::TOP || property == PropertyId::BOTTOM {
            return property;
        }
        if let Some(&inverse) = self.inverses.get(&property) {
            return inverse;
        }
        let name = format!("ObjectInverseOf({})", self.property_record(property).name);
        let inverse = PropertyId(next_id(self.properties.len()));
        self.properties.push(EntityRecord::auxiliary(name));
        self.inverses.insert(property, inverse);
        self.inverses.insert(inverse, property);
        inverse
    }

    /// The inverse of `property` if one has already been minted
    pub fn inverse_pair(&self, property: PropertyId) -> Option<PropertyId> {
        if property == PropertyId::TOP || property == PropertyId::BOTTOM {
            return Some(property);
        }
        self.inverses.get(&property).copied()
    }

    pub fn is_auxiliary(&self, entity: impl Into<Entity>) -> bool {
        match entity.into() {
            Entity::Class(id) => self.class_record(id).auxiliary,
            Entity::Property(id) => self.property_record(id).auxiliary,
            Entity::Individual(id) => self.individual_record(id).auxiliary,
        }
    }

    pub fn contains(&self, entity: impl Into<Entity>) -> bool {
        match entity.into() {
            Entity::Class(id) => id.index() < self.classes.len(),
            Entity::Property(id) => id.index() < self.properties.len(),
            Entity::Individual(id) => id.index() < self.individuals.len(),
        }
    }

    pub fn name_of(&self, entity: impl Into<Entity>) -> &str {
        match entity.into() {
            Entity::Class(id) => &self.class_record(id).name,
            Entity::Property(id) => &self.property_record(id).name,
            Entity::Individual(id) => &self.individual_record(id).name,
        }
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    pub fn property_by_name(&self, name: &str) -> Option<PropertyId> {
        self.property_names.get(name).copied()
    }

    pub fn individual_by_name(&self, name: &str) -> Option<IndividualId> {
        self.individual_names.get(name).copied()
    }

    pub fn classes(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(|i| ClassId(i as u32))
    }

    pub fn properties(&self) -> impl Iterator<Item = PropertyId> {
        (0..self.properties.len()).map(|i| PropertyId(i as u32))
    }

    pub fn individuals(&self) -> impl Iterator<Item = IndividualId> {
        (0..self.individuals.len()).map(|i| IndividualId(i as u32))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    fn class_record(&self, id: ClassId) -> &EntityRecord {
        self.classes
            .get(id.index())
            .unwrap_or_else(|| panic!("class {} was not issued by this entity manager", id))
    }

    fn property_record(&self, id: PropertyId) -> &EntityRecord {
        self.properties
            .get(id.index())
            .unwrap_or_else(|| panic!("property {} was not issued by this entity manager", id))
    }

    fn individual_record(&self, id: IndividualId) -> &EntityRecord {
        self.individuals
            .get(id.index())
            .unwrap_or_else(|| panic!("individual {} was not issued by this entity manager", id))
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
