//! Human-readable views of a unit: the signal to resource mapping and a
//! debug dump.

use std::fmt;

use super::address::ResourceAddress;
use super::condition::LogicEntry;
use super::Alu;
use crate::core::signal::{Behavior, SignalId, SignalRegistry};

/// Where one signal ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub signal: SignalId,
    pub name: String,
    pub resource: Option<ResourceAddress>,
}

/// Resource of every non-builtin signal, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingReport {
    entries: Vec<MappingEntry>,
}

impl MappingReport {
    pub fn from_signals(signals: &SignalRegistry) -> Self {
        let entries = signals
            .iter()
            .filter(|(_, s)| s.behavior() != Behavior::Builtin)
            .map(|(id, s)| MappingEntry {
                signal: id,
                name: s.name().to_string(),
                resource: s.binding(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&MappingEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl fmt::Display for MappingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match entry.resource {
                Some(address) => writeln!(f, "{}\t\t{}", entry.name, address.name())?,
                None => writeln!(f, "{}\t\tnone", entry.name)?,
            }
        }
        Ok(())
    }
}

fn write_logic(
    f: &mut fmt::Formatter<'_>,
    signals: &SignalRegistry,
    entries: &[&LogicEntry],
) -> fmt::Result {
    for entry in entries {
        writeln!(
            f,
            "\t\t{} = {}",
            signals.name(entry.signal),
            entry.logic.to_infix(signals)
        )?;
    }
    Ok(())
}

impl<'def> Alu<'def> {
    pub fn mapping_report(&self) -> MappingReport {
        MappingReport::from_signals(&self.signals)
    }

    /// Multi-line description of signals, condition logic and program.
    pub fn dump(&self) -> impl fmt::Display + '_ {
        AluDump { alu: self }
    }
}

struct AluDump<'a, 'def> {
    alu: &'a Alu<'def>,
}

impl fmt::Display for AluDump<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alu = self.alu;
        writeln!(f, "{} : alu", alu.name)?;
        for (_, signal) in alu.signals.iter() {
            writeln!(f, "\t{}", signal)?;
        }

        if !alu.logic.is_empty() {
            f.write_str("\tTF\n\t{\n")?;
            let entries: Vec<_> = alu.logic.entries().iter().collect();
            write_logic(f, &alu.signals, &entries)?;
            f.write_str("\t}\n")?;
        }

        let tfa: Vec<&LogicEntry> = alu
            .branches
            .iter()
            .chain(alu.cond_bypass.as_ref())
            .chain(alu.cond_update.as_ref())
            .collect();
        if !tfa.is_empty() {
            f.write_str("\tTFA\n\t{\n")?;
            write_logic(f, &alu.signals, &tfa)?;
            f.write_str("\t}\n")?;
        }

        if !alu.instructions.is_empty() {
            f.write_str("\tinst\n\t{\n")?;
            for inst in &alu.instructions {
                writeln!(f, "\t\t{}", inst.display(&alu.signals))?;
            }
            f.write_str("\t}\n")?;
        }
        Ok(())
    }
}
