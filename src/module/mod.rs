// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus modules and their status codecs.
//!
//! A [`Module`] is one addressable device on the bus. Its behaviour is
//! selected by a closed [`Variant`] chosen from the module type when the
//! module is created:
//!
//! | Variant | Types | Status payload |
//! |---------|-------|----------------|
//! | Relay | `BIR`, `DMR`, `TRP` | channel mask in hex |
//! | Input | `IS4`, `IS8` | channel mask in hex |
//! | Dimmer | `DIM`, `D10` | eight hex levels |
//! | Temperature | `TSB`, `TE1`, `TE2`, `LC3`, `PBL` | current, preset, mode, profile |
//! | Variable | `VAR` | hex value |
//!
//! Payloads containing `[` are info records answering `APPINFO`. They are
//! stored on the module and never reach the [`UpdateSink`].
//!
//! # Examples
//!
//! ```
//! use domintell_lib::command::Command;
//! use domintell_lib::module::Module;
//! use domintell_lib::protocol::CommandQueue;
//! use domintell_lib::types::{Channel, ModuleAddress, ModuleType};
//!
//! let queue = CommandQueue::new();
//! let address = ModuleAddress::from_hex("01A2B3").unwrap();
//! let relay = Module::new(ModuleType::Bir, address, queue.clone());
//!
//! relay.execute(Command::On, Some(Channel::new(1).unwrap())).unwrap();
//! assert_eq!(queue.try_pop().as_deref(), Some("BIR 1A2B3-1%I"));
//!
//! relay.decode("I01");
//! assert!(relay.io_state().unwrap().is_active(Channel::new(1).unwrap()));
//! ```

mod dimmer;
mod info;
mod io;
mod sink;
mod temperature;
mod variable;

use std::fmt;
use std::sync::Arc;

pub use dimmer::{DimmerModule, MAX_LEVEL};
pub use info::ModuleInfo;
pub use io::{IoModule, IoState};
pub use sink::{ModuleUpdate, UpdateSink};
pub use temperature::{TemperatureModule, TemperatureStatus};
pub use variable::VariableModule;

use crate::command::{Command, CommandFrame, Op, WireCommand};
use crate::error::{CommandError, ParseError};
use crate::protocol::CommandQueue;
use crate::types::{Channel, InverterMask, ModuleAddress, ModuleKind, ModuleType};

use sink::SinkSlot;

/// Registry key of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey {
    /// Device category.
    pub module_type: ModuleType,
    /// Bus address.
    pub address: ModuleAddress,
}

impl ModuleKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(module_type: ModuleType, address: ModuleAddress) -> Self {
        Self {
            module_type,
            address,
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.module_type, self.address)
    }
}

/// Codec and decoded state specific to a device category.
#[derive(Debug)]
pub enum Variant {
    /// Switched outputs.
    Relay(IoModule),
    /// Push buttons and contacts.
    Input(IoModule),
    /// Dimmed outputs.
    Dimmer(DimmerModule),
    /// Thermostat.
    Temperature(TemperatureModule),
    /// System variable.
    Variable(VariableModule),
}

impl Variant {
    fn for_kind(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Relay => Self::Relay(IoModule::new()),
            ModuleKind::Input => Self::Input(IoModule::new()),
            ModuleKind::Dimmer => Self::Dimmer(DimmerModule::new()),
            ModuleKind::Temperature => Self::Temperature(TemperatureModule::new()),
            ModuleKind::Variable => Self::Variable(VariableModule::new()),
        }
    }

    /// Returns the variant kind.
    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        match self {
            Self::Relay(_) => ModuleKind::Relay,
            Self::Input(_) => ModuleKind::Input,
            Self::Dimmer(_) => ModuleKind::Dimmer,
            Self::Temperature(_) => ModuleKind::Temperature,
            Self::Variable(_) => ModuleKind::Variable,
        }
    }
}

/// Returns the payload after its kind marker.
fn payload_body(payload: &str) -> Result<&str, ParseError> {
    payload
        .get(1..)
        .filter(|body| !body.trim().is_empty())
        .ok_or_else(|| ParseError::TruncatedPayload(payload.to_string()))
}

/// One addressable device on the bus.
///
/// Modules are shared through `Arc` by the registry; all methods take
/// `&self`.
#[derive(Debug)]
pub struct Module {
    key: ModuleKey,
    queue: CommandQueue,
    sink: SinkSlot,
    variant: Variant,
}

impl Module {
    /// Creates a module whose commands are pushed to `queue`.
    #[must_use]
    pub fn new(module_type: ModuleType, address: ModuleAddress, queue: CommandQueue) -> Self {
        Self {
            key: ModuleKey::new(module_type, address),
            queue,
            sink: SinkSlot::default(),
            variant: Variant::for_kind(module_type.kind()),
        }
    }

    /// Returns the registry key.
    #[must_use]
    pub const fn key(&self) -> ModuleKey {
        self.key
    }

    /// Returns the device category.
    #[must_use]
    pub const fn module_type(&self) -> ModuleType {
        self.key.module_type
    }

    /// Returns the bus address.
    #[must_use]
    pub const fn address(&self) -> ModuleAddress {
        self.key.address
    }

    /// Returns the variant kind.
    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        self.variant.kind()
    }

    /// Returns the variant with its decoded state.
    #[must_use]
    pub const fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Returns the relay or input part of the module.
    #[must_use]
    pub const fn as_io(&self) -> Option<&IoModule> {
        match &self.variant {
            Variant::Relay(io) | Variant::Input(io) => Some(io),
            _ => None,
        }
    }

    /// Returns the dimmer part of the module.
    #[must_use]
    pub const fn as_dimmer(&self) -> Option<&DimmerModule> {
        match &self.variant {
            Variant::Dimmer(dimmer) => Some(dimmer),
            _ => None,
        }
    }

    /// Returns the thermostat part of the module.
    #[must_use]
    pub const fn as_temperature(&self) -> Option<&TemperatureModule> {
        match &self.variant {
            Variant::Temperature(temperature) => Some(temperature),
            _ => None,
        }
    }

    /// Returns the variable part of the module.
    #[must_use]
    pub const fn as_variable(&self) -> Option<&VariableModule> {
        match &self.variant {
            Variant::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    // ========== Commands ==========

    /// Encodes a command into the frames it is sent as.
    ///
    /// Most commands produce one frame; pushes produce two and a variable
    /// refresh produces none.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Unsupported` if the variant has no encoding
    /// for the command, `CommandError::ChannelRequired` if a channel
    /// command lacks its channel, or `CommandError::Value` for an invalid
    /// argument.
    pub fn encode(
        &self,
        command: Command,
        channel: Option<Channel>,
    ) -> Result<Vec<String>, CommandError> {
        let (module_type, address) = (self.module_type(), self.address());
        let frames = match &self.variant {
            Variant::Relay(_) => io::encode_relay(module_type, address, command, channel),
            Variant::Input(_) => io::encode_input(module_type, address, command, channel),
            Variant::Dimmer(_) => dimmer::encode(module_type, address, command, channel),
            Variant::Temperature(_) => {
                temperature::encode(module_type, address, command, channel)
            }
            Variant::Variable(_) => variable::encode(module_type, address, command, channel),
        }?;
        Ok(frames.iter().map(WireCommand::to_wire).collect())
    }

    /// Encodes a command and queues its frames for sending.
    ///
    /// # Errors
    ///
    /// Same as [`encode`](Self::encode); nothing is queued on error.
    pub fn execute(&self, command: Command, channel: Option<Channel>) -> Result<(), CommandError> {
        let frames = self.encode(command, channel)?;
        tracing::debug!(module = %self.key, %command, frames = frames.len(), "Executing command");
        for frame in frames {
            self.queue.push(frame);
        }
        Ok(())
    }

    /// Queues a status query for the whole module.
    pub fn request_status(&self) {
        let frame = CommandFrame::new(self.module_type(), self.address()).op(Op::Query);
        self.queue.push(frame);
    }

    // ========== Inbound ==========

    /// Processes a status payload addressed to this module.
    ///
    /// `payload` is the frame without its type and address, trimmed. Info
    /// records are stored as metadata. Status updates are decoded, stored
    /// and passed to the update sink. Malformed payloads are logged and
    /// leave the previous state in place.
    pub fn decode(&self, payload: &str) {
        if payload.contains('[') {
            if let Err(e) = self.store_info(payload) {
                tracing::warn!(module = %self.key, payload, error = %e, "Invalid app info received");
            }
            return;
        }

        match self.decode_status(payload) {
            Ok(update) => {
                tracing::trace!(module = %self.key, ?update, "Status decoded");
                self.sink.dispatch(self, &update);
            }
            Err(e) => {
                tracing::warn!(module = %self.key, payload, error = %e, "Invalid feedback received");
            }
        }
    }

    fn store_info(&self, payload: &str) -> Result<(), ParseError> {
        match &self.variant {
            Variant::Relay(io) | Variant::Input(io) => io.store_info(payload).map(|_| ()),
            Variant::Dimmer(dimmer) => dimmer.store_info(payload),
            Variant::Temperature(temperature) => temperature.store_info(payload),
            Variant::Variable(variable) => variable.store_info(payload),
        }
    }

    fn decode_status(&self, payload: &str) -> Result<ModuleUpdate, ParseError> {
        Ok(match &self.variant {
            Variant::Relay(io) | Variant::Input(io) => ModuleUpdate::Io(io.decode(payload)?),
            Variant::Dimmer(dimmer) => ModuleUpdate::Dimmer(dimmer.decode(payload)?),
            Variant::Temperature(temperature) => {
                ModuleUpdate::Temperature(temperature.decode(payload)?)
            }
            Variant::Variable(variable) => ModuleUpdate::Variable(variable.decode(payload)?),
        })
    }

    // ========== State ==========

    /// Returns the relay or input state after the inverter mask.
    #[must_use]
    pub fn io_state(&self) -> Option<IoState> {
        self.as_io().and_then(IoModule::state)
    }

    /// Returns the relay or input mask as reported.
    #[must_use]
    pub fn raw_mask(&self) -> Option<u8> {
        self.as_io().and_then(IoModule::raw_mask)
    }

    /// Returns the dimmer levels.
    #[must_use]
    pub fn dimmer_levels(&self) -> Option<[u8; 8]> {
        self.as_dimmer().and_then(DimmerModule::levels)
    }

    /// Returns the thermostat reading.
    #[must_use]
    pub fn temperature(&self) -> Option<TemperatureStatus> {
        self.as_temperature().and_then(TemperatureModule::status)
    }

    /// Returns the variable value.
    #[must_use]
    pub fn variable_value(&self) -> Option<u32> {
        self.as_variable().and_then(VariableModule::value)
    }

    /// Returns the module-wide info record.
    ///
    /// Relay and input modules describe each channel instead, see
    /// [`channel_info`](Self::channel_info).
    #[must_use]
    pub fn info(&self) -> Option<ModuleInfo> {
        match &self.variant {
            Variant::Relay(_) | Variant::Input(_) => None,
            Variant::Dimmer(dimmer) => dimmer.info(),
            Variant::Temperature(temperature) => temperature.info(),
            Variant::Variable(variable) => variable.info(),
        }
    }

    /// Returns the info record of a relay or input channel.
    #[must_use]
    pub fn channel_info(&self, channel: Channel) -> Option<ModuleInfo> {
        self.as_io().and_then(|io| io.channel_info(channel))
    }

    /// Sets the inverter mask of a relay or input module.
    ///
    /// Returns false, leaving the module untouched, for other variants.
    pub fn set_inverter_mask(&self, mask: InverterMask) -> bool {
        match self.as_io() {
            Some(io) => {
                io.set_inverter_mask(mask);
                true
            }
            None => {
                tracing::debug!(module = %self.key, "Inverter mask ignored for module without channel mask");
                false
            }
        }
    }

    // ========== Update sink ==========

    /// Registers the sink receiving decoded updates.
    ///
    /// A module has at most one sink. The previous sink, if any, is
    /// returned so replacing it is never silent.
    pub fn set_update_sink<S>(&self, sink: S) -> Option<Arc<dyn UpdateSink>>
    where
        S: UpdateSink + 'static,
    {
        self.sink.replace(Arc::new(sink))
    }

    /// Unregisters the sink and returns it.
    pub fn clear_update_sink(&self) -> Option<Arc<dyn UpdateSink>> {
        self.sink.take()
    }

    /// Returns true if a sink is registered.
    #[must_use]
    pub fn has_update_sink(&self) -> bool {
        self.sink.is_set()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::types::RegulationMode;

    fn module(module_type: ModuleType) -> (Module, CommandQueue) {
        let queue = CommandQueue::new();
        let address = ModuleAddress::from_hex("01A2B3").unwrap();
        (Module::new(module_type, address, queue.clone()), queue)
    }

    fn drain(queue: &CommandQueue) -> Vec<String> {
        std::iter::from_fn(|| queue.try_pop()).collect()
    }

    fn channel(index: u8) -> Channel {
        Channel::new(index).unwrap()
    }

    #[test]
    fn variant_follows_module_type() {
        for module_type in ModuleType::ALL {
            let (module, _) = module(module_type);
            assert_eq!(module.kind(), module_type.kind());
        }
    }

    #[test]
    fn execute_queues_frames_in_order() {
        let (input, queue) = module(ModuleType::Is8);
        input.execute(Command::ShortPush, Some(channel(2))).unwrap();

        assert_eq!(drain(&queue), vec!["IS8 1A2B3-2%P1", "IS8 1A2B3-2%P2"]);
    }

    #[test]
    fn failed_execute_queues_nothing() {
        let (relay, queue) = module(ModuleType::Bir);
        let err = relay.execute(Command::SetLevel(10), Some(channel(1))).unwrap_err();

        assert!(matches!(err, CommandError::Unsupported { .. }));
        assert!(queue.is_empty());
    }

    #[test]
    fn request_status_queries_module() {
        let (thermostat, queue) = module(ModuleType::Te2);
        thermostat.request_status();
        assert_eq!(drain(&queue), vec!["TE2 1A2B3%S"]);
    }

    #[test]
    fn decode_notifies_sink() {
        let (relay, _) = module(ModuleType::Bir);
        let updates = Arc::new(Mutex::new(Vec::new()));
        let updates_clone = updates.clone();
        relay.set_update_sink(move |module: &Module, update: &ModuleUpdate| {
            assert_eq!(module.module_type(), ModuleType::Bir);
            updates_clone.lock().push(*update);
        });

        relay.decode("I01");

        assert_eq!(*updates.lock(), vec![ModuleUpdate::Io(IoState::new(0x01))]);
    }

    #[test]
    fn info_records_never_reach_sink() {
        let calls = Arc::new(AtomicU32::new(0));
        for (module_type, record) in [
            (ModuleType::Bir, "I1Lamp[Hall]"),
            (ModuleType::Dim, "D Spots[Kitchen]"),
            (ModuleType::Te1, "T Thermostat[Office][x]"),
            (ModuleType::Var, "Night[House]"),
            (ModuleType::Is4, "I9broken[record"),
        ] {
            let (module, _) = module(module_type);
            let calls_clone = calls.clone();
            module.set_update_sink(move |_: &Module, _: &ModuleUpdate| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            });
            module.decode(record);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn info_records_are_stored() {
        let (relay, _) = module(ModuleType::Bir);
        relay.decode("I1Lamp[Hall]");
        assert_eq!(relay.channel_info(channel(1)).unwrap().location, "Hall");
        assert!(relay.info().is_none());

        let (thermostat, _) = module(ModuleType::Te1);
        thermostat.decode("T Thermostat[Office]");
        assert_eq!(thermostat.info().unwrap().name, "Thermostat");
    }

    #[test]
    fn malformed_status_skips_sink() {
        let (dimmer, _) = module(ModuleType::D10);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        dimmer.set_update_sink(move |_: &Module, _: &ModuleUpdate| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        dimmer.decode("D 0");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(dimmer.dimmer_levels().is_none());
    }

    #[test]
    fn replacing_sink_returns_previous() {
        let (variable, _) = module(ModuleType::Var);
        assert!(variable.set_update_sink(|_: &Module, _: &ModuleUpdate| {}).is_none());
        assert!(variable.set_update_sink(|_: &Module, _: &ModuleUpdate| {}).is_some());
        assert!(variable.clear_update_sink().is_some());
        assert!(!variable.has_update_sink());
    }

    #[test]
    fn inverter_mask_only_for_io_modules() {
        let (relay, _) = module(ModuleType::Dmr);
        assert!(relay.set_inverter_mask(InverterMask::new(0xFF)));
        relay.decode("I00");
        assert_eq!(relay.io_state(), Some(IoState::new(0xFF)));
        assert_eq!(relay.raw_mask(), Some(0x00));

        let (variable, _) = module(ModuleType::Var);
        assert!(!variable.set_inverter_mask(InverterMask::new(0xFF)));
    }

    #[test]
    fn accessors_match_variant() {
        let (thermostat, _) = module(ModuleType::Tsb);
        thermostat.decode("T 20.0 21.0 COMFORT 21.0");

        assert_eq!(thermostat.temperature().unwrap().mode, RegulationMode::Comfort);
        assert!(thermostat.io_state().is_none());
        assert!(thermostat.dimmer_levels().is_none());
        assert!(thermostat.variable_value().is_none());
    }

    #[test]
    fn key_display() {
        let (relay, _) = module(ModuleType::Bir);
        assert_eq!(relay.key().to_string(), "BIR01A2B3");
    }
}
