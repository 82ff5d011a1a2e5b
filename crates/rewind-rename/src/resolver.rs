//! Execution ordering for batch renames.
//!
//! Renaming `a -> b` while another file in the same folder and batch is
//! still called `b` would clobber it. The resolver reorders the batch so
//! that the file currently holding a path is always renamed before the file
//! that wants that path:
//!
//! ```text
//! file1 -> file2
//! file2 -> file3      file2 must be renamed first
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while ordering a batch rename.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The parallel lists have different lengths.
    #[error("Mismatched rename lists: {files} files, {names} names")]
    LengthMismatch { files: usize, names: usize },

    /// The renames form a cycle (e.g. `a -> b`, `b -> a`), so no order works.
    #[error("Cyclic rename between {}", names.join(", "))]
    Cycle { names: Vec<String> },
}

/// Reorder `items` in place so no rename overwrites a path that another
/// pending rename still has to vacate.
///
/// `current_path` returns the path an item has now, `target_path` the path
/// it is about to take. Same-named files in different folders never block
/// each other. Items are moved as a whole, so any data carried alongside
/// the paths stays aligned.
///
/// Returns the number of moves performed.
pub fn sort_for_rename<T, C, N>(
    items: &mut Vec<T>,
    current_path: C,
    target_path: N,
) -> Result<usize, ResolveError>
where
    C: Fn(&T) -> PathBuf,
    N: Fn(&T) -> PathBuf,
{
    let keys: Vec<(PathBuf, PathBuf)> = items
        .iter()
        .map(|item| (current_path(item), target_path(item)))
        .collect();

    check_cycles(&keys)?;

    let count = keys.len();
    let limit = count * count + 1;
    let mut order: Vec<usize> = (0..count).collect();
    let mut moves = 0;

    'restart: loop {
        for i in 0..count {
            let target = &keys[order[i]].1;
            for j in (i + 1)..count {
                if keys[order[j]].0 == *target {
                    let blocker = order.remove(j);
                    order.insert(0, blocker);
                    moves += 1;

                    if moves > limit {
                        return Err(ResolveError::Cycle {
                            names: keys.iter().map(|(current, _)| file_name(current)).collect(),
                        });
                    }
                    continue 'restart;
                }
            }
        }
        break;
    }

    if moves > 0 {
        tracing::debug!(target: "rename", moves, count, "reordered batch rename");
        let mut slots: Vec<Option<T>> = items.drain(..).map(Some).collect();
        items.extend(order.iter().filter_map(|&index| slots[index].take()));
    }

    Ok(moves)
}

/// Reorder a selection and its new names in lock-step.
///
/// ```
/// use std::path::PathBuf;
/// use rewind_rename::reorder;
///
/// let mut selection = vec![PathBuf::from("/d/A"), PathBuf::from("/d/B")];
/// let mut names = vec!["B".to_string(), "C".to_string()];
/// reorder(&mut selection, &mut names).unwrap();
///
/// assert_eq!(selection, vec![PathBuf::from("/d/B"), PathBuf::from("/d/A")]);
/// assert_eq!(names, vec!["C".to_string(), "B".to_string()]);
/// ```
pub fn reorder(selection: &mut Vec<PathBuf>, new_names: &mut Vec<String>) -> Result<usize, ResolveError> {
    if selection.len() != new_names.len() {
        return Err(ResolveError::LengthMismatch {
            files: selection.len(),
            names: new_names.len(),
        });
    }

    let mut pairs: Vec<(PathBuf, String)> = selection.drain(..).zip(new_names.drain(..)).collect();
    let result = sort_for_rename(&mut pairs, |(path, _)| path.clone(), |(path, name)| path.with_file_name(name));

    for (path, name) in pairs {
        selection.push(path);
        new_names.push(name);
    }

    result
}

/// The final component of a path as a string.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Fail if following "is blocked by" links ever returns to a visited item.
fn check_cycles(keys: &[(PathBuf, PathBuf)]) -> Result<(), ResolveError> {
    let mut by_current: HashMap<&Path, Vec<usize>> = HashMap::new();
    for (index, (current, _)) in keys.iter().enumerate() {
        by_current.entry(current.as_path()).or_default().push(index);
    }

    let blockers = |index: usize| -> Vec<usize> {
        by_current
            .get(keys[index].1.as_path())
            .map(|found| found.iter().copied().filter(|&b| b != index).collect())
            .unwrap_or_default()
    };

    // 0 = unvisited, 1 = on the current path, 2 = done
    let mut state = vec![0u8; keys.len()];
    for start in 0..keys.len() {
        if state[start] != 0 {
            continue;
        }

        let mut stack: Vec<(usize, Vec<usize>)> = vec![(start, blockers(start))];
        state[start] = 1;

        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            match pending.pop() {
                Some(next) if state[next] == 1 => {
                    let from = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
                    let names = stack[from..]
                        .iter()
                        .map(|(n, _)| file_name(&keys[*n].0))
                        .collect();
                    return Err(ResolveError::Cycle { names });
                }
                Some(next) if state[next] == 0 => {
                    state[next] = 1;
                    stack.push((next, blockers(next)));
                }
                Some(_) => {}
                None => {
                    state[node] = 2;
                    stack.pop();
                }
            }
        }
    }

    Ok(())
}
