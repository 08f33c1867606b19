//! The AKD step driver.
//!
//! One call to [`process_step`] runs one protocol transition against the files that
//! belong to `params.filename`:
//!
//! ```text
//! Uninitialized --GenerateCommon--> CommonReady --GenerateKeypair--> KeypairReady
//!               --Exchange--> SharedSecretReady
//! ```
//!
//! Sequencing is the caller's job. Nothing checks that the steps come in this order;
//! a step whose input files do not exist yet fails with the `IoError` of the first read.
//!
//! There is no file locking either. Parties sharing a path across threads or processes
//! must synchronize externally.

use crate::config::MincryptConfig;
use crate::dh::DhCommon;
use crate::errors::MincryptError;

use super::codec;
use super::flags::{Direction, FieldMask};
use super::keypair::AkdKeyPair;

use itertools::Itertools;

use rand::Rng;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What a step does.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum AkdOperation {
    /// Generate `p`, `g` of the given bit strength and write the common file.
    GenerateCommon { bits: u32 },
    /// Read the common file, generate `count` keypairs, write the private and public files.
    GenerateKeypair,
    /// Combine the local private values with a peer's public file into shared secrets.
    Exchange { peer_public: PathBuf },
}

impl AkdOperation {
    pub fn name(&self) -> &'static str {
        match self {
            AkdOperation::GenerateCommon { .. } => "common",
            AkdOperation::GenerateKeypair => "keypair",
            AkdOperation::Exchange { .. } => "exchange",
        }
    }
}

/// Session descriptor for one [`process_step`] call.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AkdParams {
    pub operation: AkdOperation,
    pub direction: Direction,
    /// Exchange round, starting at 1.
    pub step: u32,
    /// Number of parties.
    pub count: usize,
    /// Base path; the material lives in `<filename>.common`, `.private` and `.public`.
    pub filename: PathBuf,
}

impl FromStr for AkdParams {
    type Err = MincryptError;

    /// Parses `key=value` pairs separated by commas, e.g.
    /// `op=exchange,dir=receiver,step=2,count=1,file=alice,peer=bob.public`.
    ///
    /// Keys: `op` (`common`, `keypair`, `exchange`), `dir` (`sender`, `receiver`),
    /// `step`, `count`, `file`, `bits` (with `op=common`), `peer` (with `op=exchange`).
    /// `step` defaults to 1 and `count` to 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |msg: String| MincryptError::InvalidParameters(msg);

        let mut op = None;
        let mut direction = None;
        let mut step = 1u32;
        let mut count = 1usize;
        let mut filename = None;
        let mut bits = None;
        let mut peer = None;

        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(invalid(format!("expected key=value, got '{}'", pair)));
            };
            let value = value.trim();

            match key.trim() {
                "op" | "type" => op = Some(value.to_string()),
                "dir" | "direction" => {
                    direction = Some(match value {
                        "sender" => Direction::SENDER,
                        "receiver" => Direction::RECEIVER,
                        other => return Err(invalid(format!("unknown direction '{}'", other))),
                    })
                }
                "step" => {
                    step = value
                        .parse()
                        .map_err(|_| invalid(format!("bad step '{}'", value)))?
                }
                "count" => {
                    count = value
                        .parse()
                        .map_err(|_| invalid(format!("bad count '{}'", value)))?
                }
                "bits" => {
                    bits = Some(
                        value
                            .parse()
                            .map_err(|_| invalid(format!("bad bits '{}'", value)))?,
                    )
                }
                "file" => filename = Some(PathBuf::from(value)),
                "peer" => peer = Some(PathBuf::from(value)),
                other => return Err(invalid(format!("unknown key '{}'", other))),
            }
        }

        let operation = match op.as_deref() {
            Some("common") => AkdOperation::GenerateCommon {
                bits: bits.ok_or_else(|| invalid("op=common needs bits".to_string()))?,
            },
            Some("keypair") => AkdOperation::GenerateKeypair,
            Some("exchange") => AkdOperation::Exchange {
                peer_public: peer.ok_or_else(|| invalid("op=exchange needs peer".to_string()))?,
            },
            Some(other) => return Err(invalid(format!("unknown op '{}'", other))),
            None => return Err(invalid("missing op".to_string())),
        };

        Ok(Self {
            operation,
            direction: direction.ok_or_else(|| invalid("missing dir".to_string()))?,
            step,
            count,
            filename: filename.ok_or_else(|| invalid("missing file".to_string()))?,
        })
    }
}

/// A file path and its size at one point in time; `size` is `None` while the file
/// does not exist.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileSnapshot {
    pub path: PathBuf,
    pub size: Option<u64>,
}

impl FileSnapshot {
    pub fn capture(path: impl AsRef<Path>) -> Result<Self, MincryptError> {
        let path = path.as_ref();
        let size = match std::fs::metadata(path) {
            Ok(meta) => Some(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            size,
        })
    }
}

impl fmt::Display for FileSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            Some(size) => write!(f, "{} ({} bytes)", self.path.display(), size),
            None => write!(f, "{} (missing)", self.path.display()),
        }
    }
}

/// The three files of one party.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct KeyFiles {
    pub common: PathBuf,
    pub private: PathBuf,
    pub public: PathBuf,
}

impl KeyFiles {
    pub fn for_base(base: impl AsRef<Path>) -> Self {
        let with_suffix = |suffix: &str| {
            let mut name = base.as_ref().as_os_str().to_owned();
            name.push(".");
            name.push(suffix);
            PathBuf::from(name)
        };

        Self {
            common: with_suffix("common"),
            private: with_suffix("private"),
            public: with_suffix("public"),
        }
    }

    pub fn snapshot(&self) -> Result<FileSetSnapshot, MincryptError> {
        Ok(FileSetSnapshot {
            common: FileSnapshot::capture(&self.common)?,
            private: FileSnapshot::capture(&self.private)?,
            public: FileSnapshot::capture(&self.public)?,
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileSetSnapshot {
    pub common: FileSnapshot,
    pub private: FileSnapshot,
    pub public: FileSnapshot,
}

/// Record of one executed step: role, round, output values and the state of the
/// party's files right before and right after the step.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AkdProcessData {
    pub step: u32,
    pub direction: Direction,
    /// `[p, g]` for common generation, public values for keypair generation,
    /// shared secrets for an exchange.
    pub values: Vec<u64>,
    pub before: FileSetSnapshot,
    pub after: FileSetSnapshot,
}

impl AkdProcessData {
    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn to_json(&self) -> Result<String, MincryptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for AkdProcessData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AKD step {} ({})", self.step, self.direction)?;
        writeln!(f, "  values: [{}]", self.values.iter().join(", "))?;
        for (label, snapshot) in [("before", &self.before), ("after", &self.after)] {
            writeln!(f, "  {}:", label)?;
            writeln!(f, "    common:  {}", snapshot.common)?;
            writeln!(f, "    private: {}", snapshot.private)?;
            writeln!(f, "    public:  {}", snapshot.public)?;
        }
        Ok(())
    }
}

fn read_common(path: &Path, config: &MincryptConfig) -> Result<DhCommon, MincryptError> {
    let stored = codec::read_file(path, FieldMask::COMMON, config.max_field_values)?.common;

    DhCommon::try_with(stored.p, stored.g).map_err(|e| {
        MincryptError::FormatError(format!("{} holds unusable parameters: {}", path.display(), e))
    })
}

fn require_parties(count: usize) -> Result<(), MincryptError> {
    if count == 0 {
        return Err(MincryptError::InvalidParameters(
            "party count must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Runs one protocol step. The first failing sub-operation aborts the step; files
/// written before the failure are left as they are.
pub fn process_step(
    rng: &mut impl Rng,
    config: &MincryptConfig,
    params: &AkdParams,
) -> Result<AkdProcessData, MincryptError> {
    config.validate()?;

    let files = KeyFiles::for_base(&params.filename);
    let before = files.snapshot()?;

    tracing::debug!(
        step = params.step,
        op = params.operation.name(),
        direction = %params.direction,
        file = %params.filename.display(),
        "running AKD step"
    );

    let values = match &params.operation {
        AkdOperation::GenerateCommon { bits } => {
            let common = DhCommon::generate_with(rng, *bits, config.small_prime_bits)?;
            let keypair = AkdKeyPair {
                common,
                ..AkdKeyPair::default()
            };
            codec::write_file(&files.common, &keypair, FieldMask::COMMON)?;

            vec![common.p, common.g]
        }
        AkdOperation::GenerateKeypair => {
            require_parties(params.count)?;
            let common = read_common(&files.common, config)?;
            let keypair = AkdKeyPair::generate(rng, params.count, &common)?;

            codec::write_file(&files.private, &keypair, FieldMask::PRIVATE)?;
            codec::write_file(&files.public, &keypair, FieldMask::PUBLIC)?;

            keypair.public_values
        }
        AkdOperation::Exchange { peer_public } => {
            require_parties(params.count)?;
            let common = read_common(&files.common, config)?;
            let local =
                codec::read_file(&files.private, FieldMask::PRIVATE, config.max_field_values)?;
            let peer = codec::read_file(peer_public, FieldMask::PUBLIC, config.max_field_values)?;

            let (private_count, public_count) =
                (local.private_values.len(), peer.public_values.len());
            if private_count < params.count || public_count < params.count {
                return Err(MincryptError::FormatError(format!(
                    "exchange for {} parties but found {} private and {} peer public values",
                    params.count, private_count, public_count
                )));
            }

            peer.public_values
                .iter()
                .zip(&local.private_values)
                .take(params.count)
                .map(|(&public, &private)| common.shared_secret(public, private))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let after = files.snapshot()?;

    tracing::info!(
        step = params.step,
        op = params.operation.name(),
        values = values.len(),
        "AKD step complete"
    );

    Ok(AkdProcessData {
        step: params.step,
        direction: params.direction,
        values,
        before,
        after,
    })
}
