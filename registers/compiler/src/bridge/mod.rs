// Licensed under the Apache-2.0 license

//! Local Bus bridge generation.
//!
//! The bridge is a Verilog module `<protocol>2lb_<map>` that terminates one
//! bus family (selected by `lb_bridge.type`) and exposes the resolved
//! register map through an internal Local Bus. The submodules split the work:
//!
//! - `protocol`: the table of supported bus families
//! - `logic`: per-field templates and generated signal names
//! - `generate`: Verilog emission
//! - `model`: a cycle model of the emitted logic, used to check behavior

mod generate;
pub mod logic;
pub mod model;
pub mod protocol;

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

use crate::error::{config_err, conflict, Error, Result};
use crate::layout::ResolvedMap;
use crate::util::{bit_mask, is_identifier};
use generate::Emitter;
use logic::BankPlan;
use model::{BridgeModel, BusDriver};
use protocol::{BusGeometry, Protocol};

/// A rendered bridge module.
#[derive(Clone, Debug)]
pub struct BridgeSource {
    pub protocol: &'static Protocol,
    pub module: String,
    pub file_name: String,
    pub text: String,
}

/// Select the protocol and name every signal. `Ok(None)` means no bridge
/// was requested.
fn prepare<'m>(resolved: &'m ResolvedMap<'m>) -> Result<Option<(&'static Protocol, BankPlan<'m>)>> {
    let config = resolved.config();
    let Some(protocol) = protocol::lookup(config.lb_bridge_type())? else {
        return Ok(None);
    };
    let data_width = config.data_width();
    if resolved.data_width != data_width {
        conflict!(
            "map resolved for a {}-bit bus, bridge configured for {data_width} bits",
            resolved.data_width
        );
    }
    if !protocol.supports_data_width(data_width) {
        conflict!(
            "{} does not support a {data_width}-bit data bus (supported: {:?})",
            protocol.title,
            protocol.data_widths
        );
    }
    let increment = config.address_increment();
    if increment < config.data_bytes() {
        conflict!(
            "address increment {increment} is smaller than the {}-byte data bus",
            config.data_bytes()
        );
    }
    let filler = config.raw_read_filler();
    if filler & !bit_mask(data_width) != 0 {
        config_err!("read_filler {filler:#x} does not fit the {data_width}-bit data bus");
    }
    let plan = BankPlan::new(resolved, protocol)?;
    Ok(Some((protocol, plan)))
}

fn geometry(resolved: &ResolvedMap) -> BusGeometry {
    BusGeometry {
        address_width: resolved.address_width,
        data_width: resolved.data_width,
        reset: resolved.config().register_reset(),
    }
}

/// Render the bridge for `resolved`, or `Ok(None)` when `lb_bridge.type`
/// is `none`.
pub fn render_bridge(resolved: &ResolvedMap, mapname: &str) -> Result<Option<BridgeSource>> {
    let Some((protocol, plan)) = prepare(resolved)? else {
        log::info!("lb_bridge.type is 'none', skipping bridge generation");
        return Ok(None);
    };
    if !is_identifier(mapname) {
        config_err!("register map name '{mapname}' cannot be used in a module name");
    }
    let module = protocol.module_name(mapname);
    let file_name = format!("{module}.v");
    let emitter = Emitter {
        plan: &plan,
        protocol,
        bus: geometry(resolved),
        read_filler: resolved.config().read_filler(),
        module: &module,
        mapname,
    };
    let text = emitter.emit().map_err(|e| Error::render(&file_name, e))?;
    log::debug!(
        "rendered {} ({} registers, {} lines)",
        file_name,
        plan.registers.len(),
        text.lines().count()
    );
    Ok(Some(BridgeSource {
        protocol,
        module,
        file_name,
        text,
    }))
}

/// Build a cycle model of the bridge [`render_bridge`] would emit, with a
/// driver for its bus family. `Ok(None)` when no bridge is requested.
pub fn build_model(resolved: &ResolvedMap) -> Result<Option<(BridgeModel, BusDriver)>> {
    let Some((protocol, plan)) = prepare(resolved)? else {
        return Ok(None);
    };
    let model = BridgeModel::new(&plan, resolved.data_width, resolved.config().read_filler());
    Ok(Some((model, BusDriver::new(protocol))))
}
