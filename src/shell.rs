//! Line-oriented command shell over a mounted file system.

use std::io::{BufRead, Write};

use sfs::{BlockDevice, BlockAllocator, Error, FileSystem};

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Ls(&'a str),
    Stat(&'a str),
    Touch(&'a str),
    Mkdir(&'a str),
    Write { path: &'a str, offset: u64, data: &'a str },
    Cat(&'a str),
    Truncate { path: &'a str, size: u64 },
    Rm(&'a str),
    Rmdir(&'a str),
    Df,
    Help,
    Quit,
}

pub fn parse(line: &str) -> core::result::Result<Option<Command<'_>>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();
    let arg = |name: &str| {
        if rest.is_empty() {
            Err(format!("{name}: missing path"))
        } else {
            Ok(rest)
        }
    };
    let command = match cmd {
        "ls" => Command::Ls(if rest.is_empty() { "/" } else { rest }),
        "stat" => Command::Stat(arg("stat")?),
        "touch" => Command::Touch(arg("touch")?),
        "mkdir" => Command::Mkdir(arg("mkdir")?),
        "cat" => Command::Cat(arg("cat")?),
        "rm" => Command::Rm(arg("rm")?),
        "rmdir" => Command::Rmdir(arg("rmdir")?),
        "write" => {
            // write <path> <offset> <text...>
            let mut parts = rest.splitn(3, char::is_whitespace);
            let (Some(path), Some(offset)) = (parts.next(), parts.next()) else {
                return Err("usage: write <path> <offset> <text>".to_string());
            };
            let offset = offset.parse().map_err(|_| format!("write: bad offset {offset:?}"))?;
            Command::Write { path, offset, data: parts.next().unwrap_or("") }
        }
        "truncate" => {
            let (path, size) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: truncate <path> <size>".to_string())?;
            let size = size.trim().parse().map_err(|_| format!("truncate: bad size {size:?}"))?;
            Command::Truncate { path, size }
        }
        "df" => Command::Df,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("{other}: unknown command")),
    };
    Ok(Some(command))
}

/// Runs commands from `input` until end of input or `quit`.
/// File system errors are reported with their errno and do not stop the shell.
pub fn run<D, A>(fs: &FileSystem<D, A>, input: impl BufRead, mut out: impl Write) -> anyhow::Result<()>
where
    D: BlockDevice,
    A: BlockAllocator,
{
    for line in input.lines() {
        let line = line?;
        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                writeln!(out, "error: {msg}")?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(fs, command, &mut out)? {
            writeln!(out, "error: {e} (errno {})", e.to_errno())?;
        }
    }
    Ok(())
}

/// Outer result is an output failure, inner result the file system's answer.
fn execute<D, A>(
    fs: &FileSystem<D, A>,
    command: Command<'_>,
    out: &mut impl Write,
) -> anyhow::Result<core::result::Result<(), Error>>
where
    D: BlockDevice,
    A: BlockAllocator,
{
    match command {
        Command::Ls(path) => match fs.read_dir(path) {
            Ok(names) => {
                for name in names {
                    writeln!(out, "{name}")?;
                }
            }
            Err(e) => return Ok(Err(e)),
        },
        Command::Stat(path) => match fs.attributes(path) {
            Ok(attr) => writeln!(
                out,
                "ino={} kind={:?} size={} blocks={} perm={:o} nlink={}",
                attr.ino, attr.kind, attr.size, attr.blocks, attr.perm, attr.nlink
            )?,
            Err(e) => return Ok(Err(e)),
        },
        Command::Touch(path) => return Ok(fs.create(path).map(drop)),
        Command::Mkdir(path) => return Ok(fs.mkdir(path).map(drop)),
        Command::Write { path, offset, data } => match fs.write(path, offset, data.as_bytes()) {
            Ok(n) => writeln!(out, "{n}")?,
            Err(e) => return Ok(Err(e)),
        },
        Command::Cat(path) => {
            let mut buf = vec![0u8; fs.usage().block_size];
            match fs.read(path, 0, &mut buf) {
                Ok(n) => writeln!(out, "{}", String::from_utf8_lossy(&buf[..n]))?,
                Err(e) => return Ok(Err(e)),
            }
        }
        Command::Truncate { path, size } => return Ok(fs.truncate(path, size)),
        Command::Rm(path) => return Ok(fs.unlink(path)),
        Command::Rmdir(path) => return Ok(fs.rmdir(path)),
        Command::Df => {
            let usage = fs.usage();
            writeln!(
                out,
                "block_size={} blocks={} used={} free={} inodes={}",
                usage.block_size,
                usage.blocks_created,
                usage.blocks_in_use,
                usage.blocks_free(),
                usage.inodes
            )?;
        }
        Command::Help => writeln!(
            out,
            "commands: ls [path], stat, touch, mkdir, write <path> <offset> <text>, cat, \
             truncate <path> <size>, rm, rmdir, df, quit"
        )?,
        Command::Quit => {}
    }
    Ok(Ok(()))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::sync::Mutex;

    use sfs::{FsConfig, Result};

    use super::*;

    struct MemDisk(Mutex<Vec<u8>>);

    impl BlockDevice for MemDisk {
        fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            let data = self.0.lock().unwrap();
            for (i, byte) in buf.iter_mut().enumerate() {
                *byte = data.get(offset as usize + i).copied().unwrap_or(0);
            }
            Ok(buf.len())
        }

        fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
            let mut data = self.0.lock().unwrap();
            let end = offset as usize + buf.len();
            if data.len() < end {
                data.resize(end, 0);
            }
            data[offset as usize..end].copy_from_slice(buf);
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse("ls").unwrap(), Some(Command::Ls("/")));
        assert_eq!(parse("  mkdir /foo ").unwrap(), Some(Command::Mkdir("/foo")));
        assert_eq!(
            parse("write /a 3 hello world").unwrap(),
            Some(Command::Write { path: "/a", offset: 3, data: "hello world" })
        );
        assert_eq!(parse("truncate /a 10").unwrap(), Some(Command::Truncate { path: "/a", size: 10 }));
        assert_eq!(parse("# comment").unwrap(), None);
        assert!(parse("stat").is_err());
        assert!(parse("write /a x hi").is_err());
        assert!(parse("frobnicate /a").is_err());
    }

    #[test]
    fn test_session() {
        let fs = FileSystem::mount(Arc::new(MemDisk(Mutex::new(Vec::new()))), FsConfig::default());
        let script = "mkdir /foo\ntouch /foo/bar\nwrite /foo/bar 0 hello\ncat /foo/bar\nls /foo\n\
                      touch /missing/x\nrmdir /foo\nls /\ndf\nquit\nls /\n";
        let mut out = Vec::new();
        run(&fs, script.as_bytes(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "5");
        assert_eq!(lines[1], "hello");
        assert_eq!(lines[2], "bar");
        assert!(lines[3].starts_with("error: parent directory missing"));
        assert!(lines[3].ends_with(&format!("(errno {})", libc::ENOENT)));
        assert_eq!(lines[4], "block_size=4096 blocks=1 used=0 free=1 inodes=1");
        assert_eq!(lines.len(), 5);
    }
}
