//! A line-oriented session of file operations with undo and redo.
//!
//! Every successful operation is recorded with the undo manager, so `undo`
//! and `redo` step back and forth through what the session did.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use color_eyre::eyre::{Result, bail, eyre};

use rewind_core::{ApplyOutcome, Direction};
use rewind_ops::{
    ArchiveFormat, BatchRenameOperation, Completion, CompressOperation, CreateOperation,
    ExtractOperation, FileOperationsService, LocalFileOperations, OwnershipKind, OwnershipOperation,
    PermissionsOperation, RecursivePermissionChange, RecursivePermissionsOperation, RenameOperation, TransferKind,
    TransferOperation, TransferReport, TrashOperation, UndoManager, wait,
};
use rewind_rename::{MetadataTable, RenameMode, SelectedFile, SortMode, find_conflicts, new_names, parse_template, reorder};
use tokio_util::sync::CancellationToken;

const HELP: &str = "\
Commands (quote arguments containing spaces):
  move SRC... DEST            move items into DEST
  copy SRC... DEST            copy items into DEST
  duplicate SRC...            copy items next to themselves
  link SRC... DEST            create symbolic links in DEST
  trash PATH...               move items to the trash
  rename PATH NAME            rename an item
  batch-rename TEMPLATE PATH...
                              rename many items, e.g. \"Photo [1, 2, 3]\"
  touch PATH                  create an empty file
  mkdir PATH                  create a folder
  template TEMPLATE PATH      create a file from a template
  chmod MODE PATH             set permission bits (octal)
  chmod-r FILE_MODE DIR_MODE PATH
                              set permission bits of everything under PATH
  chown OWNER PATH            change the owning user
  chgrp GROUP PATH            change the owning group
  extract ARCHIVE... DEST     extract archives into DEST
  compress OUTPUT SRC...      pack items into OUTPUT (.zip, .tar, .tar.gz, ...)
  undo | redo                 step through the history
  status                      show what undo and redo would do
  clear                       forget the history
  help | quit";

pub struct Session {
    service: Arc<LocalFileOperations>,
    manager: UndoManager<LocalFileOperations>,
    use_trash: bool,
}

impl Session {
    pub fn new(service: Arc<LocalFileOperations>, manager: UndoManager<LocalFileOperations>, use_trash: bool) -> Self {
        Self {
            service,
            manager,
            use_trash,
        }
    }

    /// Run every line of a script, stopping at the first failing line.
    pub async fn run_script(&mut self, script: &str) -> Result<()> {
        for (number, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            println!("> {}", line);
            match self.execute(line).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => bail!("line {}: {}", number + 1, e),
            }
        }
        Ok(())
    }

    /// Read commands from standard input until `quit` or end of input.
    pub async fn run_interactive(&mut self) -> Result<()> {
        println!("Type `help` for the list of commands.");
        let stdin = std::io::stdin();

        loop {
            print!("rewind> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            match self.execute(line.trim()).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => eprintln!("error: {}", e),
            }
        }
        Ok(())
    }

    /// Execute one command line. Returns `false` when the session should end.
    async fn execute(&mut self, line: &str) -> Result<bool> {
        let words = shlex::split(line).ok_or_else(|| eyre!("Unbalanced quotes"))?;
        let Some((command, args)) = words.split_first() else {
            return Ok(true);
        };

        match command.as_str() {
            "move" | "copy" | "link" => {
                let kind = match command.as_str() {
                    "move" => TransferKind::Move,
                    "copy" => TransferKind::Copy,
                    _ => TransferKind::Link,
                };
                let (sources, destination) = sources_and_last(args)?;
                self.transfer(kind, sources, destination).await?;
            }
            "duplicate" => {
                let sources = paths(args, 1)?;
                let source_dir = parent_of(&sources[0]);
                let report = run(self.service.duplicate(sources, CancellationToken::new())).await?;
                self.record_transfer(TransferKind::Duplicate, source_dir.clone(), source_dir, &report)?;
            }
            "trash" => {
                let targets = paths(args, 1)?;
                run(self.service.trash_or_delete(targets.clone(), CancellationToken::new())).await?;
                if self.use_trash {
                    self.manager.push_operation(TrashOperation::now(targets));
                } else {
                    println!("Deleted permanently; this cannot be undone.");
                }
            }
            "rename" => {
                let [path, name] = exact::<2>(args)?;
                let path = PathBuf::from(path);
                run(self.service.rename(path.clone(), name.clone())).await?;
                self.manager.push_operation(RenameOperation::new(path, name));
            }
            "batch-rename" => {
                let Some((template, files)) = args.split_first() else {
                    bail!("usage: batch-rename TEMPLATE PATH...");
                };
                self.batch_rename(template, paths(files, 1)?).await?;
            }
            "touch" | "mkdir" => {
                let [path] = exact::<1>(args)?;
                let path = PathBuf::from(path);
                let (parent, name) = (parent_of(&path), file_name(&path)?);
                if command == "touch" {
                    let created = run(self.service.new_file(parent, name, None)).await?;
                    self.manager.push_operation(CreateOperation::empty_file(created, None));
                } else {
                    let created = run(self.service.new_folder(parent, name)).await?;
                    self.manager.push_operation(CreateOperation::folder(created));
                }
            }
            "template" => {
                let [template, path] = exact::<2>(args)?;
                let path = PathBuf::from(path);
                let (parent, name) = (parent_of(&path), file_name(&path)?);
                let created = run(self.service.new_file_from_template(parent, name, PathBuf::from(&template))).await?;
                self.manager.push_operation(CreateOperation::from_template(created, template));
            }
            "chmod" => {
                let [mode, path] = exact::<2>(args)?;
                self.chmod(parse_mode(&mode)?, PathBuf::from(path)).await?;
            }
            "chmod-r" => {
                let [file_mode, dir_mode, path] = exact::<3>(args)?;
                let change = RecursivePermissionChange {
                    file_permissions: parse_mode(&file_mode)?,
                    file_mask: 0o7777,
                    dir_permissions: parse_mode(&dir_mode)?,
                    dir_mask: 0o7777,
                };
                let root = PathBuf::from(path);
                let originals = run(self.service.set_permissions_recursive(
                    root.clone(),
                    change,
                    CancellationToken::new(),
                ))
                .await?;
                self.manager
                    .push_operation(RecursivePermissionsOperation::new(root, change).with_originals(originals));
            }
            "chown" | "chgrp" => {
                let kind = if command == "chown" {
                    OwnershipKind::Owner
                } else {
                    OwnershipKind::Group
                };
                let [value, path] = exact::<2>(args)?;
                self.chown(kind, value, PathBuf::from(path)).await?;
            }
            "extract" => {
                let (sources, destination) = sources_and_last(args)?;
                let outputs = run(self.service.extract(sources.clone(), destination.clone(), CancellationToken::new()))
                    .await?;
                for output in &outputs {
                    println!("  {}", output.display());
                }
                self.manager
                    .push_operation(ExtractOperation::new(sources, destination).with_outputs(outputs));
            }
            "compress" => {
                let Some((output, sources)) = args.split_first() else {
                    bail!("usage: compress OUTPUT SRC...");
                };
                let output = PathBuf::from(output);
                let (format, filter) = ArchiveFormat::detect(&output)
                    .ok_or_else(|| eyre!("Unknown archive type: {}", output.display()))?;
                let sources = paths(sources, 1)?;
                let written = run(self.service.compress(
                    sources.clone(),
                    output,
                    format,
                    filter,
                    CancellationToken::new(),
                ))
                .await?;
                println!("  {}", written.display());
                self.manager
                    .push_operation(CompressOperation::new(sources, written, format, filter));
            }
            "undo" => self.apply(Direction::Undo).await?,
            "redo" => self.apply(Direction::Redo).await?,
            "status" => self.print_status(),
            "clear" => self.manager.clear(),
            "help" => println!("{}", HELP),
            "quit" | "exit" => return Ok(false),
            other => bail!("Unknown command '{}'; type `help`", other),
        }

        Ok(true)
    }

    async fn transfer(&mut self, kind: TransferKind, sources: Vec<PathBuf>, destination: PathBuf) -> Result<()> {
        let source_dir = parent_of(&sources[0]);
        let cancel = CancellationToken::new();

        let request = match kind {
            TransferKind::Move => self.service.move_items(sources, destination.clone(), cancel),
            TransferKind::Copy => self.service.copy_items(sources, destination.clone(), cancel),
            _ => self.service.link(sources, destination.clone(), cancel),
        };
        let report = run(request).await?;
        self.record_transfer(kind, source_dir, destination, &report)
    }

    fn record_transfer(
        &mut self,
        kind: TransferKind,
        source_dir: PathBuf,
        destination: PathBuf,
        report: &TransferReport,
    ) -> Result<()> {
        for pair in &report.completed {
            println!("  {} -> {}", pair.origin.display(), pair.target.display());
        }
        if !report.completed.is_empty() {
            self.manager
                .push_operation(TransferOperation::from_report(kind, source_dir, destination, report));
        }
        if report.has_errors() {
            bail!(report.error_summary());
        }
        Ok(())
    }

    async fn batch_rename(&mut self, template: &str, files: Vec<PathBuf>) -> Result<()> {
        let mut selection: Vec<SelectedFile> = files.into_iter().map(SelectedFile::from_disk).collect();
        rewind_rename::sort_selection(&mut selection, SortMode::default(), &HashMap::new());

        let mut paths: Vec<PathBuf> = selection.into_iter().map(|f| f.path).collect();
        let names: Vec<String> = paths.iter().map(|p| rewind_rename::file_name(p)).collect();
        let metadata = MetadataTable::for_names(names.iter().cloned());
        let mut renamed = new_names(&RenameMode::Format(parse_template(template)), &names, &metadata);

        let conflicts = find_conflicts(&paths, &renamed, |dir, name| dir.join(name).symlink_metadata().is_ok());
        if let Some(conflict) = conflicts.first() {
            bail!(
                "'{}' conflicts with another file ({} conflict(s))",
                conflict.new_name,
                conflicts.len()
            );
        }

        let operation = BatchRenameOperation::from_lists(paths.clone(), renamed.clone())?;
        reorder(&mut paths, &mut renamed)?;
        let done = run(self.service.batch_rename(paths, renamed, CancellationToken::new())).await?;
        for path in &done {
            println!("  {}", path.display());
        }
        self.manager.push_operation(operation);
        Ok(())
    }

    #[cfg(unix)]
    async fn chmod(&mut self, mode: u32, path: PathBuf) -> Result<()> {
        let previous = rewind_ops::mode_of(&path)?;
        run(self.service.set_permissions(path.clone(), mode)).await?;
        self.manager
            .push_operation(PermissionsOperation::new(path, previous, mode));
        Ok(())
    }

    #[cfg(not(unix))]
    async fn chmod(&mut self, _mode: u32, _path: PathBuf) -> Result<()> {
        bail!("Permissions are only supported on unix")
    }

    #[cfg(unix)]
    async fn chown(&mut self, kind: OwnershipKind, value: String, path: PathBuf) -> Result<()> {
        let (original, request) = match kind {
            OwnershipKind::Owner => (rewind_ops::owner_of(&path)?, self.service.set_owner(path.clone(), value.clone())),
            OwnershipKind::Group => (rewind_ops::group_of(&path)?, self.service.set_group(path.clone(), value.clone())),
        };
        run(request).await?;
        self.manager
            .push_operation(OwnershipOperation::new(kind, path, original, value));
        Ok(())
    }

    #[cfg(not(unix))]
    async fn chown(&mut self, _kind: OwnershipKind, _value: String, _path: PathBuf) -> Result<()> {
        bail!("Ownership is only supported on unix")
    }

    async fn apply(&mut self, direction: Direction) -> Result<()> {
        let (label, description) = match direction {
            Direction::Undo => (self.manager.undo_label(), self.manager.undo_description()),
            Direction::Redo => (self.manager.redo_label(), self.manager.redo_description()),
        };

        match self.manager.apply(direction).await? {
            ApplyOutcome::Success => println!("{}: {} (`{}` takes it back)", label, description, direction.opposite()),
            ApplyOutcome::UserCancelled => println!("{}: cancelled", label),
            ApplyOutcome::Failed(reason) => bail!("{} failed: {}", label, reason),
        }
        Ok(())
    }

    fn print_status(&self) {
        let state = self.manager.state();
        let line = |enabled: bool, label: &str, description: &str| {
            if enabled {
                format!("{} - {}", label, description)
            } else {
                format!("{} (nothing)", label)
            }
        };
        println!("{}", line(state.can_undo, &state.undo_label, &state.undo_description));
        println!("{}", line(state.can_redo, &state.redo_label, &state.redo_description));
    }
}

/// Await a service request that nobody will cancel.
async fn run<T>(completion: Completion<T>) -> Result<T> {
    Ok(wait(completion, &CancellationToken::new()).await?)
}

fn paths(args: &[String], at_least: usize) -> Result<Vec<PathBuf>> {
    if args.len() < at_least {
        bail!("Expected at least {} path(s)", at_least);
    }
    Ok(args.iter().map(PathBuf::from).collect())
}

fn sources_and_last(args: &[String]) -> Result<(Vec<PathBuf>, PathBuf)> {
    let mut all = paths(args, 2)?;
    let last = all.pop().ok_or_else(|| eyre!("Missing destination"))?;
    Ok((all, last))
}

fn exact<const N: usize>(args: &[String]) -> Result<[String; N]> {
    <[String; N]>::try_from(args.to_vec()).map_err(|_| eyre!("Expected {} argument(s), got {}", N, args.len()))
}

fn parent_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| eyre!("'{}' has no file name", path.display()))
}

fn parse_mode(text: &str) -> Result<u32> {
    u32::from_str_radix(text.trim_start_matches("0o"), 8).map_err(|_| eyre!("'{}' is not an octal mode", text))
}
