use super::meta::Meta;
use crate::cards::street::Street;
use crate::error::Error;
use crate::gameplay::edge::Edge;
use crate::mccfr::infoset::Infoset;
use crate::mccfr::memory::Memory;
use crate::mccfr::path::Path;
use crate::mccfr::profile::Profile;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use byteorder::BE;
use std::collections::BTreeMap;
use std::io::Read;
use std::io::Write;

const REGRETS_MAGIC: &[u8] = b"RVBTREG\0";
const POLICY_MAGIC: &[u8] = b"RVBTPOL\0";
const TRAILER: u16 = 0xFFFF;

/// a checkpoint is the triple (policy summary, metadata,
/// regret state) under one id; it is loadable only when all
/// three members are present and consistent. every write
/// goes through a temp file and an atomic rename.
fn id(iteration: usize) -> String {
    format!("ckpt-{:012}", iteration)
}

fn member(dir: &std::path::Path, iteration: usize, extension: &str) -> std::path::PathBuf {
    dir.join(format!("{}.{}", id(iteration), extension))
}

/// write the triple for the store as of iteration t. the
/// store's lazy scalars are materialized first so the
/// serialized accumulators are logical values exactly.
pub fn save(
    dir: &std::path::Path,
    profile: &mut Profile,
    meta: &Meta,
) -> Result<(), Error> {
    let t = meta.iteration;
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Configuration(format!("checkpoint dir: {}", e)))?;
    profile.materialize();
    write_atomic(&member(dir, t, "regrets"), |file| {
        write_regrets(file, profile, &meta.bucket_hash)
    })?;
    write_atomic(&member(dir, t, "policy"), |file| {
        write_policy(file, profile, &meta.bucket_hash)
    })?;
    write_atomic(&member(dir, t, "meta"), |file| {
        file.write_all(
            serde_json::to_string_pretty(meta)
                .expect("meta serializes")
                .as_bytes(),
        )
    })?;
    log::info!("checkpoint {} written ({})", id(t), profile);
    Ok(())
}

fn write_atomic<F>(path: &std::path::Path, write: F) -> Result<(), Error>
where
    F: FnOnce(&mut std::io::BufWriter<std::fs::File>) -> std::io::Result<()>,
{
    let attempt = || -> std::io::Result<()> {
        let tmp = path.with_extension(format!(
            "{}.tmp",
            path.extension().and_then(|e| e.to_str()).unwrap_or("tmp")
        ));
        let ref mut file = std::io::BufWriter::new(std::fs::File::create(&tmp)?);
        write(file)?;
        file.flush()?;
        std::fs::rename(&tmp, path)
    };
    attempt().map_err(|e| Error::CheckpointIncomplete(format!("{}: {}", path.display(), e)))
}

fn write_header(
    file: &mut impl Write,
    magic: &[u8],
    bucket_hash: &str,
) -> std::io::Result<()> {
    file.write_all(magic)?;
    file.write_u32::<BE>(crate::FORMAT_VERSION)?;
    file.write_u32::<BE>(bucket_hash.len() as u32)?;
    file.write_all(bucket_hash.as_bytes())?;
    Ok(())
}

fn write_cell_key(file: &mut impl Write, infoset: &Infoset, edge: &Edge) -> std::io::Result<()> {
    let (words, len) = infoset.path.raw();
    file.write_u8(u8::from(infoset.street))?;
    file.write_u16::<BE>(infoset.bucket)?;
    for word in words {
        file.write_u64::<BE>(word)?;
    }
    file.write_u8(len)?;
    file.write_u8(u8::from(*edge))?;
    Ok(())
}

fn write_regrets(
    file: &mut impl Write,
    profile: &Profile,
    bucket_hash: &str,
) -> std::io::Result<()> {
    write_header(file, REGRETS_MAGIC, bucket_hash)?;
    file.write_u64::<BE>(profile.cells() as u64)?;
    for (infoset, edges) in profile.logical().iter() {
        for (edge, memory) in edges.iter() {
            write_cell_key(file, infoset, edge)?;
            file.write_f64::<BE>(memory.regret)?;
            file.write_f64::<BE>(memory.policy)?;
        }
    }
    file.write_u16::<BE>(TRAILER)
}

/// the policy summary: every infoset's normalized average
/// strategy, the playable artifact of training
fn write_policy(
    file: &mut impl Write,
    profile: &Profile,
    bucket_hash: &str,
) -> std::io::Result<()> {
    write_header(file, POLICY_MAGIC, bucket_hash)?;
    file.write_u64::<BE>(profile.cells() as u64)?;
    for infoset in profile.logical().keys() {
        let edges = profile.edges(infoset);
        let advice = profile.advice(infoset, &edges);
        for (edge, probability) in advice.iter() {
            write_cell_key(file, infoset, edge)?;
            file.write_f64::<BE>(*probability)?;
        }
    }
    file.write_u16::<BE>(TRAILER)
}

/// newest iteration for which all three members exist
pub fn latest(dir: &std::path::Path) -> Option<usize> {
    let mut iterations = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let stem = name.strip_suffix(".meta")?;
            stem.strip_prefix("ckpt-")?.parse::<usize>().ok()
        })
        .collect::<Vec<usize>>();
    iterations.sort_unstable();
    iterations.reverse();
    iterations
        .into_iter()
        .find(|&t| {
            ["regrets", "policy", "meta"]
                .into_iter()
                .all(|ext| member(dir, t, ext).exists())
        })
}

/// load one checkpoint id, verifying the abstraction digest
pub fn load(
    dir: &std::path::Path,
    iteration: usize,
    expected_hash: &str,
) -> Result<(Profile, Meta), Error> {
    let meta = read_meta(&member(dir, iteration, "meta"))?;
    if meta.bucket_hash != expected_hash {
        return Err(Error::AbstractionMismatch {
            expected: expected_hash.to_string(),
            found: meta.bucket_hash,
        });
    }
    let profile = read_regrets(&member(dir, iteration, "regrets"), expected_hash)?;
    // the policy summary is re-derivable; its presence is
    // still required for the triple to count as complete
    if !member(dir, iteration, "policy").exists() {
        return Err(Error::CheckpointIncomplete(format!(
            "{} missing policy member",
            id(iteration)
        )));
    }
    Ok((profile, meta))
}

/// walk checkpoints newest-first, skipping incomplete or
/// unreadable ids, refusing outright on a digest mismatch
pub fn resume(
    dir: &std::path::Path,
    expected_hash: &str,
) -> Result<Option<(Profile, Meta)>, Error> {
    let mut iterations = match std::fs::read_dir(dir) {
        Err(_) => return Ok(None),
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let stem = name.strip_suffix(".meta")?;
                stem.strip_prefix("ckpt-")?.parse::<usize>().ok()
            })
            .collect::<Vec<usize>>(),
    };
    iterations.sort_unstable();
    iterations.reverse();
    for iteration in iterations {
        match load(dir, iteration, expected_hash) {
            Ok(loaded) => return Ok(Some(loaded)),
            Err(Error::AbstractionMismatch { expected, found }) => {
                return Err(Error::AbstractionMismatch { expected, found });
            }
            Err(error) => {
                log::warn!("skipping {}: {}", id(iteration), error);
                continue;
            }
        }
    }
    Ok(None)
}

fn read_meta(path: &std::path::Path) -> Result<Meta, Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::CheckpointIncomplete(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| Error::CheckpointIncomplete(format!("{}: {}", path.display(), e)))
}

fn read_regrets(path: &std::path::Path, expected_hash: &str) -> Result<Profile, Error> {
    let attempt = || -> std::io::Result<Result<Profile, Error>> {
        let ref mut file = std::io::BufReader::new(std::fs::File::open(path)?);
        let mut magic = [0u8; 8];
        file.read_exact(&mut magic)?;
        if &magic[..] != REGRETS_MAGIC {
            return Err(std::io::Error::other("bad magic"));
        }
        let version = file.read_u32::<BE>()?;
        if version != crate::FORMAT_VERSION {
            return Err(std::io::Error::other("format version mismatch"));
        }
        let hash_len = file.read_u32::<BE>()? as usize;
        let mut hash = vec![0u8; hash_len];
        file.read_exact(&mut hash)?;
        let found = String::from_utf8_lossy(&hash).into_owned();
        if found != expected_hash {
            return Ok(Err(Error::AbstractionMismatch {
                expected: expected_hash.to_string(),
                found,
            }));
        }
        let cells = file.read_u64::<BE>()?;
        let mut encounters = BTreeMap::new();
        for _ in 0..cells {
            let street = Street::from(file.read_u8()?);
            let bucket = file.read_u16::<BE>()?;
            let words = [
                file.read_u64::<BE>()?,
                file.read_u64::<BE>()?,
                file.read_u64::<BE>()?,
            ];
            let len = file.read_u8()?;
            let edge = Edge::from(file.read_u8()?);
            let regret = file.read_f64::<BE>()?;
            let policy = file.read_f64::<BE>()?;
            let infoset = Infoset::from((street, bucket, Path::from_raw(words, len)));
            encounters
                .entry(infoset)
                .or_insert_with(BTreeMap::new)
                .insert(edge, Memory::from((regret, policy)));
        }
        if file.read_u16::<BE>()? != TRAILER {
            return Err(std::io::Error::other("missing trailer"));
        }
        Ok(Ok(Profile::from(encounters)))
    };
    attempt()
        .map_err(|e| Error::CheckpointIncomplete(format!("{}: {}", path.display(), e)))?
}
