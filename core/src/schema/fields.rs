//! Canonical field names.
//!
//! Each [`Field`] pairs the wire key of the published standard (units
//! included) with the code name used in this crate. The tables are the only
//! place either string is spelled out: the reader, the writer, the
//! completeness check and the schema export all go through them.

use super::ModelType;

/// When a field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Need {
    Always,
    Optional,
    /// Required for this model and every model above it; unused below it.
    From(ModelType),
}

impl Need {
    pub fn is_required(&self, model: ModelType) -> bool {
        match self {
            Need::Always => true,
            Need::Optional => false,
            Need::From(min) => model >= *min,
        }
    }

    /// True when a field with this requirement plays no part in `model`.
    pub fn is_unused(&self, model: ModelType) -> bool {
        matches!(self, Need::From(min) if model < *min)
    }
}

/// Shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Number,
    /// Positive integer
    Count,
    Text,
    /// Semantic version string (or a legacy bare number)
    Version,
    Model,
    /// Constant, expression or table
    Value,
    NumberList,
    Section,
    /// Open mapping of names to sections or values
    Mapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Wire key, byte-for-byte as in the standard
    pub key: &'static str,
    /// Code name
    pub name: &'static str,
    pub kind: Kind,
    pub need: Need,
    pub description: &'static str,
}

const fn field(key: &'static str, name: &'static str, kind: Kind, need: Need, description: &'static str) -> Field {
    Field {
        key,
        name,
        kind,
        need,
        description,
    }
}

/// Find a field by its wire key.
pub fn by_key<'a>(table: &'a [Field], key: &str) -> Option<&'a Field> {
    table.iter().find(|f| f.key == key)
}

/// Find a field by its code name.
pub fn by_name<'a>(table: &'a [Field], name: &str) -> Option<&'a Field> {
    table.iter().find(|f| f.name == name)
}

pub mod document {
    use super::*;

    pub const HEADER: Field = field("Header", "header", Kind::Section, Need::Always, "File metadata");
    pub const PARAMETERISATION: Field = field(
        "Parameterisation",
        "parameterisation",
        Kind::Section,
        Need::Always,
        "Cell parameter set",
    );
    pub const VALIDATION: Field = field(
        "Validation",
        "validation",
        Kind::Mapping,
        Need::Optional,
        "Named experiments for validating the parameter set",
    );

    pub const FIELDS: &[Field] = &[HEADER, PARAMETERISATION, VALIDATION];
}

pub mod header {
    use super::*;

    pub const BPX: Field = field("BPX", "bpx", Kind::Version, Need::Always, "BPX format version");
    pub const TITLE: Field = field("Title", "title", Kind::Text, Need::Optional, "Parameterisation title");
    pub const DESCRIPTION: Field = field(
        "Description",
        "description",
        Kind::Text,
        Need::Optional,
        "Additional cell description such as form factor",
    );
    pub const REFERENCES: Field = field("References", "references", Kind::Text, Need::Optional, "References");
    pub const MODEL: Field = field("Model", "model", Kind::Model, Need::Always, "Model type (SPM, SPMe, DFN)");

    pub const FIELDS: &[Field] = &[BPX, TITLE, DESCRIPTION, REFERENCES, MODEL];
}

pub mod parameterisation {
    use super::*;

    pub const CELL: Field = field("Cell", "cell", Kind::Section, Need::Always, "Cell-level parameters");
    pub const ELECTROLYTE: Field = field(
        "Electrolyte",
        "electrolyte",
        Kind::Section,
        Need::From(ModelType::SPMe),
        "Electrolyte parameters",
    );
    pub const NEGATIVE_ELECTRODE: Field = field(
        "Negative electrode",
        "negative_electrode",
        Kind::Section,
        Need::Always,
        "Negative electrode parameters",
    );
    pub const POSITIVE_ELECTRODE: Field = field(
        "Positive electrode",
        "positive_electrode",
        Kind::Section,
        Need::Always,
        "Positive electrode parameters",
    );
    pub const SEPARATOR: Field = field(
        "Separator",
        "separator",
        Kind::Section,
        Need::From(ModelType::SPMe),
        "Separator parameters",
    );
    pub const USER_DEFINED: Field = field(
        "User-defined",
        "user_defined",
        Kind::Mapping,
        Need::Optional,
        "Extension parameters outside the standard",
    );

    pub const FIELDS: &[Field] = &[CELL, ELECTROLYTE, NEGATIVE_ELECTRODE, POSITIVE_ELECTRODE, SEPARATOR, USER_DEFINED];
}

pub mod cell {
    use super::*;

    pub const ELECTRODE_AREA: Field = field(
        "Electrode area [m2]",
        "electrode_area",
        Kind::Number,
        Need::Always,
        "Electrode cross-sectional area",
    );
    pub const EXTERNAL_SURFACE_AREA: Field = field(
        "External surface area [m2]",
        "external_surface_area",
        Kind::Number,
        Need::Optional,
        "External surface area of cell",
    );
    pub const VOLUME: Field = field("Volume [m3]", "volume", Kind::Number, Need::Optional, "Volume of the cell");
    pub const NUMBER_OF_ELECTRODE_PAIRS: Field = field(
        "Number of electrode pairs connected in parallel to make a cell",
        "number_of_electrode_pairs",
        Kind::Count,
        Need::Always,
        "Number of electrode pairs connected in parallel to make a cell",
    );
    pub const LOWER_VOLTAGE_CUTOFF: Field = field(
        "Lower voltage cut-off [V]",
        "lower_voltage_cutoff",
        Kind::Number,
        Need::Always,
        "Minimum allowed voltage",
    );
    pub const UPPER_VOLTAGE_CUTOFF: Field = field(
        "Upper voltage cut-off [V]",
        "upper_voltage_cutoff",
        Kind::Number,
        Need::Always,
        "Maximum allowed voltage",
    );
    pub const NOMINAL_CELL_CAPACITY: Field = field(
        "Nominal cell capacity [A.h]",
        "nominal_cell_capacity",
        Kind::Number,
        Need::Always,
        "Nominal cell capacity, used to convert between current and C-rate",
    );
    pub const AMBIENT_TEMPERATURE: Field = field(
        "Ambient temperature [K]",
        "ambient_temperature",
        Kind::Number,
        Need::Always,
        "Ambient temperature",
    );
    pub const INITIAL_TEMPERATURE: Field = field(
        "Initial temperature [K]",
        "initial_temperature",
        Kind::Number,
        Need::Optional,
        "Initial temperature",
    );
    pub const REFERENCE_TEMPERATURE: Field = field(
        "Reference temperature [K]",
        "reference_temperature",
        Kind::Number,
        Need::Optional,
        "Reference temperature for the Arrhenius temperature dependence",
    );
    pub const DENSITY: Field = field(
        "Density [kg.m-3]",
        "density",
        Kind::Number,
        Need::Optional,
        "Density (lumped)",
    );
    pub const SPECIFIC_HEAT_CAPACITY: Field = field(
        "Specific heat capacity [J.K-1.kg-1]",
        "specific_heat_capacity",
        Kind::Number,
        Need::Optional,
        "Specific heat capacity (lumped)",
    );
    pub const THERMAL_CONDUCTIVITY: Field = field(
        "Thermal conductivity [W.m-1.K-1]",
        "thermal_conductivity",
        Kind::Number,
        Need::Optional,
        "Thermal conductivity (lumped)",
    );

    pub const FIELDS: &[Field] = &[
        ELECTRODE_AREA,
        EXTERNAL_SURFACE_AREA,
        VOLUME,
        NUMBER_OF_ELECTRODE_PAIRS,
        LOWER_VOLTAGE_CUTOFF,
        UPPER_VOLTAGE_CUTOFF,
        NOMINAL_CELL_CAPACITY,
        AMBIENT_TEMPERATURE,
        INITIAL_TEMPERATURE,
        REFERENCE_TEMPERATURE,
        DENSITY,
        SPECIFIC_HEAT_CAPACITY,
        THERMAL_CONDUCTIVITY,
    ];
}

pub mod electrolyte {
    use super::*;

    pub const INITIAL_CONCENTRATION: Field = field(
        "Initial concentration [mol.m-3]",
        "initial_concentration",
        Kind::Number,
        Need::Always,
        "Initial / rest lithium ion concentration in the electrolyte",
    );
    pub const CATION_TRANSFERENCE_NUMBER: Field = field(
        "Cation transference number",
        "cation_transference_number",
        Kind::Number,
        Need::Always,
        "Cation transference number",
    );
    pub const DIFFUSIVITY: Field = field(
        "Diffusivity [m2.s-1]",
        "diffusivity",
        Kind::Value,
        Need::Always,
        "Lithium ion diffusivity in electrolyte (constant or function of concentration)",
    );
    pub const DIFFUSIVITY_ACTIVATION_ENERGY: Field = field(
        "Diffusivity activation energy [J.mol-1]",
        "diffusivity_activation_energy",
        Kind::Number,
        Need::Optional,
        "Activation energy for diffusivity in electrolyte",
    );
    pub const CONDUCTIVITY: Field = field(
        "Conductivity [S.m-1]",
        "conductivity",
        Kind::Value,
        Need::Always,
        "Electrolyte conductivity (constant or function of concentration)",
    );
    pub const CONDUCTIVITY_ACTIVATION_ENERGY: Field = field(
        "Conductivity activation energy [J.mol-1]",
        "conductivity_activation_energy",
        Kind::Number,
        Need::Optional,
        "Activation energy for conductivity in electrolyte",
    );

    pub const FIELDS: &[Field] = &[
        INITIAL_CONCENTRATION,
        CATION_TRANSFERENCE_NUMBER,
        DIFFUSIVITY,
        DIFFUSIVITY_ACTIVATION_ENERGY,
        CONDUCTIVITY,
        CONDUCTIVITY_ACTIVATION_ENERGY,
    ];
}

/// Fields describing one active material.
pub mod particle {
    use super::*;

    pub const MINIMUM_STOICHIOMETRY: Field = field(
        "Minimum stoichiometry",
        "minimum_stoichiometry",
        Kind::Number,
        Need::Always,
        "Minimum stoichiometry",
    );
    pub const MAXIMUM_STOICHIOMETRY: Field = field(
        "Maximum stoichiometry",
        "maximum_stoichiometry",
        Kind::Number,
        Need::Always,
        "Maximum stoichiometry",
    );
    pub const MAXIMUM_CONCENTRATION: Field = field(
        "Maximum concentration [mol.m-3]",
        "maximum_concentration",
        Kind::Number,
        Need::Always,
        "Maximum concentration of lithium ions in particles",
    );
    pub const PARTICLE_RADIUS: Field = field(
        "Particle radius [m]",
        "particle_radius",
        Kind::Number,
        Need::Always,
        "Particle radius",
    );
    pub const SURFACE_AREA_PER_UNIT_VOLUME: Field = field(
        "Surface area per unit volume [m-1]",
        "surface_area_per_unit_volume",
        Kind::Number,
        Need::Always,
        "Particle surface area per unit of volume",
    );
    pub const DIFFUSIVITY: Field = field(
        "Diffusivity [m2.s-1]",
        "diffusivity",
        Kind::Value,
        Need::Always,
        "Lithium ion diffusivity in particle (constant or function of stoichiometry)",
    );
    pub const DIFFUSIVITY_ACTIVATION_ENERGY: Field = field(
        "Diffusivity activation energy [J.mol-1]",
        "diffusivity_activation_energy",
        Kind::Number,
        Need::Optional,
        "Activation energy for diffusivity in particles",
    );
    pub const OCP: Field = field(
        "OCP [V]",
        "ocp",
        Kind::Value,
        Need::Always,
        "Open-circuit potential at the reference temperature, function of particle stoichiometry",
    );
    pub const ENTROPIC_CHANGE: Field = field(
        "Entropic change coefficient [V.K-1]",
        "entropic_change",
        Kind::Value,
        Need::Optional,
        "Entropic change coefficient, function of particle stoichiometry",
    );
    pub const REACTION_RATE_CONSTANT: Field = field(
        "Reaction rate constant [mol.m-2.s-1]",
        "reaction_rate_constant",
        Kind::Number,
        Need::Always,
        "Normalised reaction rate constant",
    );
    pub const REACTION_RATE_CONSTANT_ACTIVATION_ENERGY: Field = field(
        "Reaction rate constant activation energy [J.mol-1]",
        "reaction_rate_constant_activation_energy",
        Kind::Number,
        Need::Optional,
        "Activation energy of reaction rate constant in particles",
    );
    /// Only inside a blend.
    pub const VOLUME_FRACTION: Field = field(
        "Volume fraction",
        "volume_fraction",
        Kind::Number,
        Need::Always,
        "Share of the active material volume taken by this material",
    );

    pub const FIELDS: &[Field] = &[
        MINIMUM_STOICHIOMETRY,
        MAXIMUM_STOICHIOMETRY,
        MAXIMUM_CONCENTRATION,
        PARTICLE_RADIUS,
        SURFACE_AREA_PER_UNIT_VOLUME,
        DIFFUSIVITY,
        DIFFUSIVITY_ACTIVATION_ENERGY,
        OCP,
        ENTROPIC_CHANGE,
        REACTION_RATE_CONSTANT,
        REACTION_RATE_CONSTANT_ACTIVATION_ENERGY,
    ];

    pub const BLEND_FIELDS: &[Field] = &[VOLUME_FRACTION];
}

/// Electrode-level fields shared by single and blended electrodes.
pub mod electrode {
    use super::*;

    pub const THICKNESS: Field = field("Thickness [m]", "thickness", Kind::Number, Need::Always, "Electrode thickness");
    pub const POROSITY: Field = field(
        "Porosity",
        "porosity",
        Kind::Number,
        Need::From(ModelType::SPMe),
        "Electrolyte volume fraction (porosity)",
    );
    pub const TRANSPORT_EFFICIENCY: Field = field(
        "Transport efficiency",
        "transport_efficiency",
        Kind::Number,
        Need::From(ModelType::SPMe),
        "Transport efficiency / inverse MacMullin number",
    );
    pub const CONDUCTIVITY: Field = field(
        "Conductivity [S.m-1]",
        "conductivity",
        Kind::Number,
        Need::From(ModelType::DFN),
        "Effective electronic conductivity of the porous electrode matrix",
    );
    pub const PARTICLE: Field = field(
        "Particle",
        "particle",
        Kind::Mapping,
        Need::Optional,
        "Blended active materials by name",
    );

    pub const FIELDS: &[Field] = &[THICKNESS, POROSITY, TRANSPORT_EFFICIENCY, CONDUCTIVITY];
    pub const BLEND_FIELDS: &[Field] = &[PARTICLE];
}

pub mod separator {
    use super::*;

    pub const THICKNESS: Field = field("Thickness [m]", "thickness", Kind::Number, Need::Always, "Separator thickness");
    pub const POROSITY: Field = field(
        "Porosity",
        "porosity",
        Kind::Number,
        Need::Always,
        "Electrolyte volume fraction (porosity)",
    );
    pub const TRANSPORT_EFFICIENCY: Field = field(
        "Transport efficiency",
        "transport_efficiency",
        Kind::Number,
        Need::Always,
        "Transport efficiency / inverse MacMullin number",
    );

    pub const FIELDS: &[Field] = &[THICKNESS, POROSITY, TRANSPORT_EFFICIENCY];
}

pub mod experiment {
    use super::*;

    pub const TIME: Field = field("Time [s]", "time", Kind::NumberList, Need::Always, "Time in seconds");
    pub const CURRENT: Field = field("Current [A]", "current", Kind::NumberList, Need::Always, "Current vs time");
    pub const VOLTAGE: Field = field("Voltage [V]", "voltage", Kind::NumberList, Need::Always, "Voltage vs time");
    pub const TEMPERATURE: Field = field(
        "Temperature [K]",
        "temperature",
        Kind::NumberList,
        Need::Optional,
        "Temperature vs time",
    );

    pub const FIELDS: &[Field] = &[TIME, CURRENT, VOLTAGE, TEMPERATURE];
}

#[cfg(test)]
mod field_tests {
    use super::*;

    #[test]
    fn test_lookup_both_directions() {
        let f = by_key(particle::FIELDS, "OCP [V]").unwrap();
        assert_eq!(f.name, "ocp");
        assert_eq!(by_name(particle::FIELDS, "ocp").unwrap().key, "OCP [V]");
        assert!(by_key(particle::FIELDS, "OCP").is_none());
    }

    #[test]
    fn test_keys_and_names_unique_per_table() {
        let tables: &[&[Field]] = &[
            document::FIELDS,
            header::FIELDS,
            parameterisation::FIELDS,
            cell::FIELDS,
            electrolyte::FIELDS,
            particle::FIELDS,
            electrode::FIELDS,
            separator::FIELDS,
            experiment::FIELDS,
        ];
        for table in tables {
            for (i, a) in table.iter().enumerate() {
                for b in &table[i + 1..] {
                    assert_ne!(a.key, b.key);
                    assert_ne!(a.name, b.name);
                }
            }
        }
    }

    #[test]
    fn test_model_requirements() {
        let porosity = electrode::POROSITY.need;
        assert!(!porosity.is_required(ModelType::SPM));
        assert!(porosity.is_unused(ModelType::SPM));
        assert!(porosity.is_required(ModelType::SPMe));
        assert!(porosity.is_required(ModelType::DFN));

        let conductivity = electrode::CONDUCTIVITY.need;
        assert!(conductivity.is_unused(ModelType::SPMe));
        assert!(conductivity.is_required(ModelType::DFN));
        assert!(!Need::Optional.is_unused(ModelType::SPM));
    }
}
