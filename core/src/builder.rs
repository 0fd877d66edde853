use crate::index::InvertedIndex;
use crate::locked::ThreadSafeIndex;
use crate::queue::WorkQueue;
use crate::tokenizer;
use crate::Position;
use anyhow::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Whether a path names a plain-text file by extension, any capitalization.
pub fn is_text(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    lower.ends_with(".txt") || lower.ends_with(".text")
}

/// Index a file, or every text file under a directory, serially.
pub fn build(path: &Path, index: &mut InvertedIndex) -> Result<()> {
    if path.is_dir() {
        for entry in WalkDir::new(path) {
            let entry = entry?;
            if entry.file_type().is_file() && is_text(entry.path()) {
                process_file(entry.path(), index)?;
            }
        }
    } else {
        process_file(path, index)?;
    }
    Ok(())
}

/// Index a file, or every text file under a directory, one queued task per
/// file. Each task fills a fresh local index and merges it into the shared
/// one, so workers never contend on fine-grained adds. Drains the queue
/// before returning.
pub fn build_threaded(path: &Path, index: &Arc<ThreadSafeIndex>, queue: &WorkQueue) -> Result<()> {
    let traversal = if path.is_dir() {
        enqueue_directory(path, index, queue)
    } else {
        enqueue_file(path.to_path_buf(), index, queue);
        Ok(())
    };
    queue.finish();
    traversal
}

fn enqueue_directory(dir: &Path, index: &Arc<ThreadSafeIndex>, queue: &WorkQueue) -> Result<()> {
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() && is_text(entry.path()) {
            enqueue_file(entry.into_path(), index, queue);
        }
    }
    Ok(())
}

fn enqueue_file(file: PathBuf, index: &Arc<ThreadSafeIndex>, queue: &WorkQueue) {
    let index = Arc::clone(index);
    queue.execute(move || {
        let mut local = InvertedIndex::new();
        match process_file(&file, &mut local) {
            Ok(()) => index.add_all(local),
            Err(error) => {
                tracing::error!(file = %file.display(), %error, "failed to index file");
            }
        }
    });
}

/// Read one UTF-8 file line by line into the index. Positions are 1-based
/// and monotone across the whole file, counting only non-empty stems.
pub fn process_file(file: &Path, index: &mut InvertedIndex) -> Result<()> {
    let location = file.to_string_lossy().into_owned();
    let reader = BufReader::new(File::open(file)?);
    let mut next_position: Position = 1;
    for line in reader.lines() {
        index_line(&line?, &location, index, &mut next_position);
    }
    Ok(())
}

/// Stem one line into the index, advancing the shared position counter.
/// Also used by the crawler for lines of extracted page text.
pub fn index_line(
    line: &str,
    location: &str,
    index: &mut InvertedIndex,
    next_position: &mut Position,
) {
    for stem in tokenizer::stems(line) {
        index.add(&stem, location, *next_position);
        *next_position += 1;
    }
}
