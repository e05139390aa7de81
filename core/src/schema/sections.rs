//! Typed document sections and their table-driven readers/writers.

use super::fields::{cell, electrode, electrolyte, experiment, particle, separator, Field};
use super::reader::{IssueKind, Section, SectionWriter};
use crate::error::ValidationError;
use crate::value::{json_kind, Value};
use std::collections::BTreeMap;

/// Tolerance on the sum of blend volume fractions.
pub const BLEND_FRACTION_TOLERANCE: f64 = 1e-6;

/// Cell-level parameters not specific to any one component.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub electrode_area: f64,
    pub external_surface_area: Option<f64>,
    pub volume: Option<f64>,
    pub number_of_electrode_pairs: u32,
    pub lower_voltage_cutoff: f64,
    pub upper_voltage_cutoff: f64,
    pub nominal_cell_capacity: f64,
    pub ambient_temperature: f64,
    pub initial_temperature: Option<f64>,
    pub reference_temperature: Option<f64>,
    pub density: Option<f64>,
    pub specific_heat_capacity: Option<f64>,
    pub thermal_conductivity: Option<f64>,
}

impl Cell {
    pub(crate) fn read(s: &mut Section) -> Self {
        Self {
            electrode_area: s.number(&cell::ELECTRODE_AREA),
            external_surface_area: s.opt_number(&cell::EXTERNAL_SURFACE_AREA),
            volume: s.opt_number(&cell::VOLUME),
            number_of_electrode_pairs: s.count(&cell::NUMBER_OF_ELECTRODE_PAIRS),
            lower_voltage_cutoff: s.number(&cell::LOWER_VOLTAGE_CUTOFF),
            upper_voltage_cutoff: s.number(&cell::UPPER_VOLTAGE_CUTOFF),
            nominal_cell_capacity: s.number(&cell::NOMINAL_CELL_CAPACITY),
            ambient_temperature: s.number(&cell::AMBIENT_TEMPERATURE),
            initial_temperature: s.opt_number(&cell::INITIAL_TEMPERATURE),
            reference_temperature: s.opt_number(&cell::REFERENCE_TEMPERATURE),
            density: s.opt_number(&cell::DENSITY),
            specific_heat_capacity: s.opt_number(&cell::SPECIFIC_HEAT_CAPACITY),
            thermal_conductivity: s.opt_number(&cell::THERMAL_CONDUCTIVITY),
        }
    }

    pub(crate) fn write(&self, w: &mut SectionWriter) {
        w.number(&cell::ELECTRODE_AREA, self.electrode_area)
            .opt_number(&cell::EXTERNAL_SURFACE_AREA, self.external_surface_area)
            .opt_number(&cell::VOLUME, self.volume)
            .json(
                &cell::NUMBER_OF_ELECTRODE_PAIRS,
                self.number_of_electrode_pairs.into(),
            )
            .number(&cell::LOWER_VOLTAGE_CUTOFF, self.lower_voltage_cutoff)
            .number(&cell::UPPER_VOLTAGE_CUTOFF, self.upper_voltage_cutoff)
            .number(&cell::NOMINAL_CELL_CAPACITY, self.nominal_cell_capacity)
            .number(&cell::AMBIENT_TEMPERATURE, self.ambient_temperature)
            .opt_number(&cell::INITIAL_TEMPERATURE, self.initial_temperature)
            .opt_number(&cell::REFERENCE_TEMPERATURE, self.reference_temperature)
            .opt_number(&cell::DENSITY, self.density)
            .opt_number(&cell::SPECIFIC_HEAT_CAPACITY, self.specific_heat_capacity)
            .opt_number(&cell::THERMAL_CONDUCTIVITY, self.thermal_conductivity);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Electrolyte {
    pub initial_concentration: f64,
    pub cation_transference_number: f64,
    /// Function of concentration
    pub diffusivity: Value,
    pub diffusivity_activation_energy: Option<f64>,
    /// Function of concentration
    pub conductivity: Value,
    pub conductivity_activation_energy: Option<f64>,
}

impl Electrolyte {
    pub(crate) fn read(s: &mut Section) -> Self {
        Self {
            initial_concentration: s.number(&electrolyte::INITIAL_CONCENTRATION),
            cation_transference_number: s.number(&electrolyte::CATION_TRANSFERENCE_NUMBER),
            diffusivity: s.value(&electrolyte::DIFFUSIVITY),
            diffusivity_activation_energy: s.opt_number(&electrolyte::DIFFUSIVITY_ACTIVATION_ENERGY),
            conductivity: s.value(&electrolyte::CONDUCTIVITY),
            conductivity_activation_energy: s.opt_number(&electrolyte::CONDUCTIVITY_ACTIVATION_ENERGY),
        }
    }

    pub(crate) fn write(&self, w: &mut SectionWriter) {
        w.number(&electrolyte::INITIAL_CONCENTRATION, self.initial_concentration)
            .number(&electrolyte::CATION_TRANSFERENCE_NUMBER, self.cation_transference_number)
            .value(&electrolyte::DIFFUSIVITY, &self.diffusivity)
            .opt_number(&electrolyte::DIFFUSIVITY_ACTIVATION_ENERGY, self.diffusivity_activation_energy)
            .value(&electrolyte::CONDUCTIVITY, &self.conductivity)
            .opt_number(&electrolyte::CONDUCTIVITY_ACTIVATION_ENERGY, self.conductivity_activation_energy);
    }

    pub(crate) fn values(&self) -> Vec<(&'static Field, &Value)> {
        vec![
            (&electrolyte::DIFFUSIVITY, &self.diffusivity),
            (&electrolyte::CONDUCTIVITY, &self.conductivity),
        ]
    }
}

/// One active material.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub minimum_stoichiometry: f64,
    pub maximum_stoichiometry: f64,
    pub maximum_concentration: f64,
    pub particle_radius: f64,
    pub surface_area_per_unit_volume: f64,
    /// Function of stoichiometry
    pub diffusivity: Value,
    pub diffusivity_activation_energy: Option<f64>,
    /// Open-circuit potential, function of stoichiometry
    pub ocp: Value,
    pub entropic_change: Option<Value>,
    pub reaction_rate_constant: f64,
    pub reaction_rate_constant_activation_energy: Option<f64>,
}

impl Particle {
    pub(crate) fn read(s: &mut Section) -> Self {
        Self {
            minimum_stoichiometry: s.number(&particle::MINIMUM_STOICHIOMETRY),
            maximum_stoichiometry: s.number(&particle::MAXIMUM_STOICHIOMETRY),
            maximum_concentration: s.number(&particle::MAXIMUM_CONCENTRATION),
            particle_radius: s.number(&particle::PARTICLE_RADIUS),
            surface_area_per_unit_volume: s.number(&particle::SURFACE_AREA_PER_UNIT_VOLUME),
            diffusivity: s.value(&particle::DIFFUSIVITY),
            diffusivity_activation_energy: s.opt_number(&particle::DIFFUSIVITY_ACTIVATION_ENERGY),
            ocp: s.value(&particle::OCP),
            entropic_change: s.opt_value(&particle::ENTROPIC_CHANGE),
            reaction_rate_constant: s.number(&particle::REACTION_RATE_CONSTANT),
            reaction_rate_constant_activation_energy: s
                .opt_number(&particle::REACTION_RATE_CONSTANT_ACTIVATION_ENERGY),
        }
    }

    pub(crate) fn write(&self, w: &mut SectionWriter) {
        w.number(&particle::MINIMUM_STOICHIOMETRY, self.minimum_stoichiometry)
            .number(&particle::MAXIMUM_STOICHIOMETRY, self.maximum_stoichiometry)
            .number(&particle::MAXIMUM_CONCENTRATION, self.maximum_concentration)
            .number(&particle::PARTICLE_RADIUS, self.particle_radius)
            .number(&particle::SURFACE_AREA_PER_UNIT_VOLUME, self.surface_area_per_unit_volume)
            .value(&particle::DIFFUSIVITY, &self.diffusivity)
            .opt_number(&particle::DIFFUSIVITY_ACTIVATION_ENERGY, self.diffusivity_activation_energy)
            .value(&particle::OCP, &self.ocp)
            .opt_value(&particle::ENTROPIC_CHANGE, self.entropic_change.as_ref())
            .number(&particle::REACTION_RATE_CONSTANT, self.reaction_rate_constant)
            .opt_number(
                &particle::REACTION_RATE_CONSTANT_ACTIVATION_ENERGY,
                self.reaction_rate_constant_activation_energy,
            );
    }

    pub(crate) fn values(&self) -> Vec<(&'static Field, &Value)> {
        let mut values = vec![(&particle::DIFFUSIVITY, &self.diffusivity), (&particle::OCP, &self.ocp)];
        if let Some(entropic) = &self.entropic_change {
            values.push((&particle::ENTROPIC_CHANGE, entropic));
        }
        values
    }
}

/// A material inside a blended electrode.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendComponent {
    pub volume_fraction: f64,
    pub particle: Particle,
}

/// Named active materials whose volume fractions sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct Blend {
    components: BTreeMap<String, BlendComponent>,
}

impl Blend {
    pub fn new(components: BTreeMap<String, BlendComponent>) -> Result<Self, ValidationError> {
        if components.is_empty() {
            return Err(ValidationError::new("a blended electrode needs at least one material"));
        }
        if let Some((name, c)) = components
            .iter()
            .find(|(_, c)| !(0.0..=1.0).contains(&c.volume_fraction))
        {
            return Err(ValidationError::new(format!(
                "volume fraction of '{}' must lie in [0, 1], got {}",
                name, c.volume_fraction
            )));
        }
        let total: f64 = components.values().map(|c| c.volume_fraction).sum();
        if (total - 1.0).abs() > BLEND_FRACTION_TOLERANCE {
            return Err(ValidationError::new(format!(
                "blend volume fractions must sum to 1, got {}",
                total
            )));
        }
        Ok(Self { components })
    }

    pub fn components(&self) -> &BTreeMap<String, BlendComponent> {
        &self.components
    }

    pub fn get(&self, name: &str) -> Option<&BlendComponent> {
        self.components.get(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn read(s: &mut Section) -> Self {
        let mut components = BTreeMap::new();
        let Some(json) = s.raw(&electrode::PARTICLE) else {
            return Self { components };
        };
        let path = s.child_path(&electrode::PARTICLE);
        let Some(materials) = json.as_object() else {
            s.issues().push(
                path,
                IssueKind::WrongType,
                format!("expected an object of named materials, found {}", json_kind(json)),
            );
            return Self { components };
        };

        for (name, material) in materials {
            let key = format!("{}/{}", electrode::PARTICLE.key, name);
            let mut m = s.nested(material, &key, &[particle::FIELDS, particle::BLEND_FIELDS]);
            let volume_fraction = m.number(&particle::VOLUME_FRACTION);
            let particle = Particle::read(&mut m);
            components.insert(
                name.clone(),
                BlendComponent {
                    volume_fraction,
                    particle,
                },
            );
        }

        // Fractions that failed to read were already reported
        if components.values().any(|c| c.volume_fraction.is_nan()) {
            return Self { components };
        }
        match Blend::new(components) {
            Ok(blend) => blend,
            Err(err) => {
                s.issues().push(path, IssueKind::Validation, err.0);
                Self {
                    components: BTreeMap::new(),
                }
            }
        }
    }

    fn write(&self, w: &mut SectionWriter) {
        let mut materials = SectionWriter::new();
        for (name, component) in &self.components {
            let mut m = SectionWriter::new();
            m.number(&particle::VOLUME_FRACTION, component.volume_fraction);
            component.particle.write(&mut m);
            materials.entry(name, m.finish());
        }
        w.json(&electrode::PARTICLE, materials.finish());
    }
}

/// Active material of an electrode.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveMaterial {
    Single(Particle),
    Blended(Blend),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Electrode {
    pub thickness: f64,
    pub porosity: Option<f64>,
    pub transport_efficiency: Option<f64>,
    pub conductivity: Option<f64>,
    pub active_material: ActiveMaterial,
}

impl Electrode {
    /// Field tables for an electrode object, which depend on whether it is blended.
    pub(crate) fn tables(blended: bool) -> &'static [&'static [Field]] {
        if blended {
            &[electrode::FIELDS, electrode::BLEND_FIELDS]
        } else {
            &[electrode::FIELDS, particle::FIELDS]
        }
    }

    pub(crate) fn read(s: &mut Section, blended: bool) -> Self {
        let thickness = s.number(&electrode::THICKNESS);
        let porosity = s.opt_number(&electrode::POROSITY);
        let transport_efficiency = s.opt_number(&electrode::TRANSPORT_EFFICIENCY);
        let conductivity = s.opt_number(&electrode::CONDUCTIVITY);
        let active_material = if blended {
            ActiveMaterial::Blended(Blend::read(s))
        } else {
            ActiveMaterial::Single(Particle::read(s))
        };
        Self {
            thickness,
            porosity,
            transport_efficiency,
            conductivity,
            active_material,
        }
    }

    pub(crate) fn write(&self, w: &mut SectionWriter) {
        w.number(&electrode::THICKNESS, self.thickness)
            .opt_number(&electrode::POROSITY, self.porosity)
            .opt_number(&electrode::TRANSPORT_EFFICIENCY, self.transport_efficiency)
            .opt_number(&electrode::CONDUCTIVITY, self.conductivity);
        match &self.active_material {
            ActiveMaterial::Single(particle) => particle.write(w),
            ActiveMaterial::Blended(blend) => blend.write(w),
        }
    }

    /// The single active material, or `None` for a blend.
    pub fn particle(&self) -> Option<&Particle> {
        match &self.active_material {
            ActiveMaterial::Single(particle) => Some(particle),
            ActiveMaterial::Blended(_) => None,
        }
    }

    pub fn is_blended(&self) -> bool {
        matches!(self.active_material, ActiveMaterial::Blended(_))
    }

    /// Value fields with their key paths relative to the electrode.
    pub(crate) fn values(&self) -> Vec<(String, &Value)> {
        match &self.active_material {
            ActiveMaterial::Single(particle) => particle
                .values()
                .into_iter()
                .map(|(f, v)| (f.key.to_string(), v))
                .collect(),
            ActiveMaterial::Blended(blend) => blend
                .components
                .iter()
                .flat_map(|(name, c)| {
                    c.particle.values().into_iter().map(move |(f, v)| {
                        (format!("{}/{}/{}", electrode::PARTICLE.key, name, f.key), v)
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Separator {
    pub thickness: f64,
    pub porosity: f64,
    pub transport_efficiency: f64,
}

impl Separator {
    pub(crate) fn read(s: &mut Section) -> Self {
        Self {
            thickness: s.number(&separator::THICKNESS),
            porosity: s.number(&separator::POROSITY),
            transport_efficiency: s.number(&separator::TRANSPORT_EFFICIENCY),
        }
    }

    pub(crate) fn write(&self, w: &mut SectionWriter) {
        w.number(&separator::THICKNESS, self.thickness)
            .number(&separator::POROSITY, self.porosity)
            .number(&separator::TRANSPORT_EFFICIENCY, self.transport_efficiency);
    }
}

/// Measured time series used to validate a parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub time: Vec<f64>,
    pub current: Vec<f64>,
    pub voltage: Vec<f64>,
    pub temperature: Option<Vec<f64>>,
}

impl Experiment {
    pub fn new(
        time: Vec<f64>,
        current: Vec<f64>,
        voltage: Vec<f64>,
        temperature: Option<Vec<f64>>,
    ) -> Result<Self, ValidationError> {
        let n = time.len();
        let mut lengths = vec![("Current [A]", current.len()), ("Voltage [V]", voltage.len())];
        if let Some(t) = &temperature {
            lengths.push(("Temperature [K]", t.len()));
        }
        if let Some((key, len)) = lengths.into_iter().find(|(_, len)| *len != n) {
            return Err(ValidationError::new(format!(
                "'{}' has {} samples but 'Time [s]' has {}",
                key, len, n
            )));
        }
        if time.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ValidationError::new("'Time [s]' must be strictly increasing"));
        }
        Ok(Self {
            time,
            current,
            voltage,
            temperature,
        })
    }

    pub(crate) fn read(s: &mut Section) -> Option<Self> {
        let time = s.opt_number_list(&experiment::TIME);
        let current = s.opt_number_list(&experiment::CURRENT);
        let voltage = s.opt_number_list(&experiment::VOLTAGE);
        let temperature = s.opt_number_list(&experiment::TEMPERATURE);
        let (Some(time), Some(current), Some(voltage)) = (time, current, voltage) else {
            return None;
        };
        match Experiment::new(time, current, voltage, temperature) {
            Ok(experiment) => Some(experiment),
            Err(err) => {
                let path = s.path().to_string();
                s.issues().push(path, IssueKind::Validation, err.0);
                None
            }
        }
    }

    pub(crate) fn write(&self, w: &mut SectionWriter) {
        w.number_list(&experiment::TIME, &self.time)
            .number_list(&experiment::CURRENT, &self.current)
            .number_list(&experiment::VOLTAGE, &self.voltage);
        if let Some(t) = &self.temperature {
            w.number_list(&experiment::TEMPERATURE, t);
        }
    }
}

#[cfg(test)]
mod section_tests {
    use super::*;

    fn component(fraction: f64) -> BlendComponent {
        BlendComponent {
            volume_fraction: fraction,
            particle: Particle {
                minimum_stoichiometry: 0.1,
                maximum_stoichiometry: 0.9,
                maximum_concentration: 63104.0,
                particle_radius: 5.22e-6,
                surface_area_per_unit_volume: 382184.0,
                diffusivity: Value::Constant(4.0e-15),
                diffusivity_activation_energy: None,
                ocp: Value::Constant(4.0),
                entropic_change: None,
                reaction_rate_constant: 1e-10,
                reaction_rate_constant_activation_energy: None,
            },
        }
    }

    fn blend(fractions: &[f64]) -> Result<Blend, ValidationError> {
        let components = fractions
            .iter()
            .enumerate()
            .map(|(i, f)| (format!("Material {}", i), component(*f)))
            .collect();
        Blend::new(components)
    }

    #[test]
    fn test_blend_fractions_sum_to_one() {
        let b = blend(&[0.7, 0.3]).unwrap();
        assert_eq!(b.len(), 2);
        assert!(blend(&[0.3333333, 0.3333333, 0.3333334]).is_ok());
    }

    #[test]
    fn test_blend_fractions_off_by_more_than_tolerance() {
        let err = blend(&[0.7, 0.31]).unwrap_err();
        assert!(err.0.contains("sum to 1"));
        assert!(blend(&[0.5, 0.5 + 2e-6]).is_err());
    }

    #[test]
    fn test_blend_rejects_empty_and_out_of_range() {
        assert!(blend(&[]).is_err());
        assert!(blend(&[1.5, -0.5]).is_err());
    }

    #[test]
    fn test_experiment_lengths_must_match() {
        let ok = Experiment::new(vec![0.0, 0.1], vec![-5.0, -5.0], vec![4.2, 4.1], None);
        assert!(ok.is_ok());
        let err = Experiment::new(vec![0.0, 0.1], vec![-5.0], vec![4.2, 4.1], None).unwrap_err();
        assert!(err.0.contains("Current [A]"));
        assert!(Experiment::new(vec![0.1, 0.0], vec![-5.0, -5.0], vec![4.2, 4.1], None).is_err());
    }
}
