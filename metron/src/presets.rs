//! Preset unit catalogs
//!
//! Each group defines a family of related units and wires them
//! together with conversion edges; "all" loads every group. Constants
//! follow the classic science-tool tables, so some pairs (noted
//! below) are published values in both directions rather than exact
//! reciprocals.

use std::collections::HashSet;
use std::f64::consts::PI;

use tracing::debug;

use metron_core::UnitsError;
use metron_units::{ConversionFn, UnitRegistry};

type Loader = fn(&mut UnitRegistry) -> Result<(), UnitsError>;

const GROUPS: [(&str, Loader); 11] = [
    ("time", load_time),
    ("temp", load_temperature),
    ("length", load_length),
    ("energy", load_energy),
    ("volume", load_volume),
    ("angle", load_angle),
    ("mass", load_mass),
    ("pressure", load_pressure),
    ("magnetic", load_magnetic),
    ("concentration", load_concentration),
    ("misc", load_misc),
];

/// Load one preset group, or "all" of them. Groups already in
/// `loaded` are skipped, so repeated calls are harmless.
pub fn load_group(
    registry: &mut UnitRegistry,
    loaded: &mut HashSet<String>,
    group: &str,
) -> Result<(), UnitsError> {
    if group == "all" {
        for (name, loader) in GROUPS {
            if loaded.insert(name.to_string()) {
                loader(registry)?;
            }
        }
        debug!("loaded all preset groups");
        return Ok(());
    }
    let loader = GROUPS
        .iter()
        .find(|(name, _)| *name == group)
        .map(|(_, loader)| *loader)
        .ok_or_else(|| UnitsError::UnknownPresetGroup(group.to_string()))?;
    if loaded.insert(group.to_string()) {
        loader(registry)?;
        debug!(group, "loaded preset group");
    }
    Ok(())
}

fn load_time(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let s = reg.define_in_family("s", None, "time")?;
    reg.make_metric(s);
    let min = reg.define_in_family("min", None, "time")?;
    let h = reg.define_in_family("h", None, "time")?;
    let d = reg.define_in_family("d", None, "time")?;
    reg.define_conv(
        s,
        min,
        ConversionFn::scale(1.0 / 60.0),
        ConversionFn::scale(60.0),
    )?;
    reg.define_conv(
        s,
        h,
        ConversionFn::scale(1.0 / 3600.0),
        ConversionFn::scale(3600.0),
    )?;
    reg.define_conv(
        s,
        d,
        ConversionFn::scale(1.0 / 86400.0),
        ConversionFn::scale(86400.0),
    )?;
    Ok(())
}

fn load_temperature(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let f = reg.define_in_family("F", None, "temperature")?;
    let c = reg.define_in_family("C", None, "temperature")?;
    let k = reg.define_in_family("K", None, "temperature")?;
    let r = reg.define_in_family("R", None, "temperature")?;
    reg.define_conv(
        f,
        c,
        ConversionFn::affine(1.0 / 1.8, -32.0 / 1.8),
        ConversionFn::affine(1.8, 32.0),
    )?;
    reg.define_conv(
        c,
        k,
        ConversionFn::affine(1.0, 273.15),
        ConversionFn::affine(1.0, -273.15),
    )?;
    reg.define_conv(
        f,
        k,
        ConversionFn::affine(5.0 / 9.0, 459.67 * 5.0 / 9.0),
        ConversionFn::affine(9.0 / 5.0, -459.67),
    )?;
    reg.define_conv(
        r,
        k,
        ConversionFn::scale(5.0 / 9.0),
        ConversionFn::scale(9.0 / 5.0),
    )?;
    Ok(())
}

fn load_length(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let m = reg.define_in_family("m", None, "length")?;
    reg.make_metric(m);
    let angstrom = reg.define_in_family("A", None, "length")?;
    let inch = reg.define_in_family("in", None, "length")?;
    let ft = reg.define_in_family("ft", None, "length")?;
    let yd = reg.define_in_family("yd", None, "length")?;
    reg.define_conv(
        angstrom,
        m,
        ConversionFn::scale(1e-10),
        ConversionFn::scale(1e10),
    )?;
    reg.define_conv(
        inch,
        m,
        ConversionFn::scale(1.0 / 39.37008),
        ConversionFn::scale(39.37008),
    )?;
    reg.define_conv(
        ft,
        m,
        ConversionFn::scale(12.0 / 39.37008),
        ConversionFn::scale(39.37008 / 12.0),
    )?;
    reg.define_conv(
        yd,
        m,
        ConversionFn::scale(36.0 / 39.37008),
        ConversionFn::scale(39.37008 / 36.0),
    )?;
    Ok(())
}

fn load_energy(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let v = reg.define_in_family("V", None, "energy")?;
    reg.make_metric(v);
    let ev = reg.define_in_family("eV", None, "energy")?;
    reg.make_metric(ev);
    let j = reg.define_in_family("J", None, "energy")?;
    reg.make_metric(j);
    reg.define_conv(
        ev,
        j,
        ConversionFn::scale(1.602177e-19),
        ConversionFn::scale(1.0 / 1.602177e-19),
    )?;
    Ok(())
}

fn load_volume(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let m3 = reg.define_in_family("m3", None, "volume")?;
    reg.make_metric(m3);
    let ft3 = reg.define_in_family("ft3", None, "volume")?;
    let gal = reg.define_in_family("gal", None, "volume")?;
    let liter = reg.define_in_family("L", None, "volume")?;
    reg.make_metric(liter);
    reg.define_conv(
        m3,
        ft3,
        ConversionFn::scale(35.314667),
        ConversionFn::scale(1.0 / 35.314667),
    )?;
    reg.define_conv(
        m3,
        gal,
        ConversionFn::scale(264.1721),
        ConversionFn::scale(1.0 / 264.1721),
    )?;
    reg.define_conv(
        ft3,
        gal,
        ConversionFn::scale(7.48051),
        ConversionFn::scale(1.0 / 7.48051),
    )?;
    reg.define_conv(m3, liter, ConversionFn::scale(1e3), ConversionFn::scale(1e-3))?;
    Ok(())
}

fn load_angle(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let deg = reg.define_in_family("deg", None, "angle")?;
    let grad = reg.define_in_family("grad", None, "angle")?;
    let rad = reg.define_in_family("rad", None, "angle")?;
    reg.make_metric(rad);
    reg.define_conv(
        rad,
        deg,
        ConversionFn::scale(180.0 / PI),
        ConversionFn::scale(PI / 180.0),
    )?;
    reg.define_conv(
        rad,
        grad,
        ConversionFn::scale(200.0 / PI),
        ConversionFn::scale(PI / 200.0),
    )?;
    reg.define_conv(
        deg,
        grad,
        ConversionFn::scale(10.0 / 9.0),
        ConversionFn::scale(9.0 / 10.0),
    )?;
    Ok(())
}

fn load_mass(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let g = reg.define_in_family("g", None, "mass")?;
    reg.make_metric(g);
    let lb = reg.define_in_family("lb", None, "mass")?;
    let oz = reg.define_in_family("oz", None, "mass")?;
    reg.define_conv(
        lb,
        g,
        ConversionFn::scale(453.59237),
        ConversionFn::scale(1.0 / 453.59237),
    )?;
    reg.define_conv(
        oz,
        g,
        ConversionFn::scale(28.349523125),
        ConversionFn::scale(1.0 / 28.349523125),
    )?;
    Ok(())
}

// Pressure constants are the published table values; several pairs
// carry independently published numbers in each direction rather than
// computed reciprocals, so their round trips drift in the sixth digit.
fn load_pressure(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let atm = reg.define_in_family("atm", None, "pressure")?;
    let bar = reg.define_in_family("bar", None, "pressure")?;
    reg.make_metric(bar);
    let pa = reg.define_in_family("Pa", None, "pressure")?;
    reg.make_metric(pa);
    let psi = reg.define_in_family("psi", None, "pressure")?;
    let torr = reg.define_in_family("torr", None, "pressure")?;
    let mmhg = reg.define_in_family("mmHg", None, "pressure")?;
    reg.define_conv(bar, pa, ConversionFn::scale(1e5), ConversionFn::scale(1e-5))?;
    reg.define_conv(
        bar,
        atm,
        ConversionFn::scale(0.98692),
        ConversionFn::scale(1.0 / 0.98692),
    )?;
    reg.define_conv(
        bar,
        torr,
        ConversionFn::scale(750.06),
        ConversionFn::scale(1.0 / 750.06),
    )?;
    reg.define_conv(
        bar,
        psi,
        ConversionFn::scale(14.504),
        ConversionFn::scale(0.0689476),
    )?;
    reg.define_conv(
        pa,
        atm,
        ConversionFn::scale(9.8692e-6),
        ConversionFn::scale(101325.024),
    )?;
    reg.define_conv(
        pa,
        torr,
        ConversionFn::scale(7.5006e-3),
        ConversionFn::scale(1.0 / 7.5006e-3),
    )?;
    reg.define_conv(
        pa,
        psi,
        ConversionFn::scale(145.04e-6),
        ConversionFn::scale(6894.7625831),
    )?;
    reg.define_conv(
        torr,
        atm,
        ConversionFn::scale(1.3158e-3),
        ConversionFn::scale(760.0),
    )?;
    reg.define_conv(
        torr,
        psi,
        ConversionFn::scale(19.337e-3),
        ConversionFn::scale(51.71496),
    )?;
    reg.define_conv(torr, mmhg, ConversionFn::scale(1.0), ConversionFn::scale(1.0))?;
    reg.define_conv(
        psi,
        atm,
        ConversionFn::scale(68.046e-3),
        ConversionFn::scale(14.696),
    )?;
    Ok(())
}

fn load_magnetic(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let t = reg.define_in_family("T", None, "magnetic")?;
    reg.make_metric(t);
    let gauss = reg.define_in_family("gauss", None, "magnetic")?;
    reg.make_metric(gauss);
    let wb = reg.define_in_family("Wb", None, "magnetic")?;
    reg.make_metric(wb);
    let mx = reg.define_in_family("Mx", None, "magnetic")?;
    reg.make_metric(mx);
    reg.define_conv(t, gauss, ConversionFn::scale(1e4), ConversionFn::scale(1e-4))?;
    reg.define_conv(mx, wb, ConversionFn::scale(1e-8), ConversionFn::scale(1e8))?;
    Ok(())
}

fn load_concentration(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let ph = reg.define_in_family("pH", None, "concentration")?;
    let poh = reg.define_in_family("pOH", None, "concentration")?;
    // pOH = 14 - pH, its own inverse
    reg.define_conv(
        ph,
        poh,
        ConversionFn::affine(-1.0, 14.0),
        ConversionFn::affine(-1.0, 14.0),
    )?;
    Ok(())
}

fn load_misc(reg: &mut UnitRegistry) -> Result<(), UnitsError> {
    let mol = reg.define_in_family("mol", None, "misc")?;
    reg.make_metric(mol);
    let hz = reg.define_in_family("Hz", None, "misc")?;
    reg.make_metric(hz);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_group_checked_before_loading() {
        let mut reg = UnitRegistry::new();
        let mut loaded = HashSet::new();
        let err = load_group(&mut reg, &mut loaded, "bogus").unwrap_err();
        assert_eq!(err, UnitsError::UnknownPresetGroup("bogus".to_string()));
        assert!(reg.is_empty());
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_single_group_loads_its_units() {
        let mut reg = UnitRegistry::new();
        let mut loaded = HashSet::new();
        load_group(&mut reg, &mut loaded, "time").unwrap();
        assert!(reg.find("s").is_some());
        assert!(reg.find("ms").is_some());
        assert!(reg.find("min").is_some());
        assert!(reg.find("K").is_none());
    }

    #[test]
    fn test_reload_is_a_no_op() {
        let mut reg = UnitRegistry::new();
        let mut loaded = HashSet::new();
        load_group(&mut reg, &mut loaded, "time").unwrap();
        let count = reg.len();
        let s = reg.find("s").unwrap();
        let edges = reg.unit(s).edges.len();
        load_group(&mut reg, &mut loaded, "time").unwrap();
        load_group(&mut reg, &mut loaded, "all").unwrap();
        assert_eq!(reg.unit(s).edges.len(), edges, "no duplicate edges");
        assert!(reg.len() > count, "other groups still load");
    }

    #[test]
    fn test_all_covers_every_group() {
        let mut reg = UnitRegistry::new();
        let mut loaded = HashSet::new();
        load_group(&mut reg, &mut loaded, "all").unwrap();
        for name in [
            "s", "F", "m", "J", "m3", "rad", "g", "torr", "T", "pH", "mol",
        ] {
            assert!(reg.find(name).is_some(), "missing {}", name);
        }
        assert_eq!(loaded.len(), GROUPS.len());
    }

    #[test]
    fn test_prefix_lookalikes_stay_distinct() {
        let mut reg = UnitRegistry::new();
        let mut loaded = HashSet::new();
        load_group(&mut reg, &mut loaded, "all").unwrap();
        // "min" is minutes, not a prefix variant of anything
        let min = reg.find("min").unwrap();
        assert_eq!(reg.unit(min).family, "time");
        assert_eq!(reg.unit(min).prefix_of, None);
        // exa-volt and electron-volt differ only by case
        let exavolt = reg.find("EV").unwrap();
        let electronvolt = reg.find("eV").unwrap();
        assert_ne!(exavolt, electronvolt);
        assert_eq!(reg.unit(exavolt).prefix_of, reg.find("V"));
        assert_eq!(reg.unit(electronvolt).prefix_of, None);
    }
}
