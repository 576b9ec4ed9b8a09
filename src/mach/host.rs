use super::{Memory, Word};
use crate::lang::Error;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Read;

type Result<T> = std::result::Result<T, Error>;

/// ## Host files opened by the running program
///
/// Descriptors count up from 3. Descriptor 0 reads standard input.
/// Failures return `-1` to the program the way the C library does.

#[derive(Debug)]
pub struct Files {
    open: HashMap<Word, File>,
    next: Word,
}

impl Default for Files {
    fn default() -> Files {
        Files {
            open: HashMap::new(),
            next: 3,
        }
    }
}

impl Files {
    pub fn open(&mut self, path: &[u8], flags: Word) -> Word {
        let path = String::from_utf8_lossy(path).into_owned();
        let mut options = OpenOptions::new();
        match flags & 3 {
            0 => options.read(true),
            1 => options.write(true).create(true).truncate(true),
            _ => options.read(true).write(true).create(true),
        };
        match options.open(path) {
            Ok(file) => {
                let fd = self.next;
                self.next += 1;
                self.open.insert(fd, file);
                fd
            }
            Err(_) => -1,
        }
    }

    /// Reads up to `len` bytes. `None` stands for a failed read. The
    /// caller bounds `len` by the destination buffer.
    pub fn read(&mut self, fd: Word, len: usize) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let count = if fd == 0 {
            std::io::stdin().read(&mut buf).ok()?
        } else {
            self.open.get_mut(&fd)?.read(&mut buf).ok()?
        };
        buf.truncate(count);
        Some(buf)
    }

    pub fn close(&mut self, fd: Word) -> Word {
        match self.open.remove(&fd) {
            Some(_) => 0,
            None => -1,
        }
    }
}

/// Formats like C `printf`, reading `%s` arguments out of VM memory.
///
/// Handles `d i u x X o c s p %`, the flags `-` `0` `+`, a field width and
/// a precision. Length modifiers are accepted and ignored since every
/// argument is a full machine word. Missing arguments read as zero.
pub fn format(memory: &Memory, fmt: &[u8], args: &[Word]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(fmt.len());
    let mut args = args.iter().copied();
    let mut i = 0;
    while i < fmt.len() {
        let ch = fmt[i];
        i += 1;
        if ch != b'%' {
            out.push(ch);
            continue;
        }
        let mut left = false;
        let mut zero = false;
        let mut plus = false;
        while let Some(flag) = fmt.get(i) {
            match flag {
                b'-' => left = true,
                b'0' => zero = true,
                b'+' => plus = true,
                b' ' | b'#' => {}
                _ => break,
            }
            i += 1;
        }
        let mut width = 0;
        while let Some(d) = fmt.get(i).filter(|d| d.is_ascii_digit()) {
            width = width * 10 + (d - b'0') as usize;
            i += 1;
        }
        let mut precision = None;
        if fmt.get(i) == Some(&b'.') {
            i += 1;
            let mut p = 0;
            while let Some(d) = fmt.get(i).filter(|d| d.is_ascii_digit()) {
                p = p * 10 + (d - b'0') as usize;
                i += 1;
            }
            precision = Some(p);
        }
        while let Some(b'l') | Some(b'h') | Some(b'z') = fmt.get(i) {
            i += 1;
        }
        let conv = match fmt.get(i) {
            Some(c) => *c,
            None => {
                out.push(b'%');
                break;
            }
        };
        i += 1;
        let field: Vec<u8> = match conv {
            b'%' => {
                out.push(b'%');
                continue;
            }
            b'd' | b'i' => {
                let n = args.next().unwrap_or(0);
                if plus && n >= 0 {
                    format!("+{}", n).into_bytes()
                } else {
                    n.to_string().into_bytes()
                }
            }
            b'u' => (args.next().unwrap_or(0) as u64).to_string().into_bytes(),
            b'x' => format!("{:x}", args.next().unwrap_or(0)).into_bytes(),
            b'X' => format!("{:X}", args.next().unwrap_or(0)).into_bytes(),
            b'o' => format!("{:o}", args.next().unwrap_or(0)).into_bytes(),
            b'p' => format!("{:#x}", args.next().unwrap_or(0)).into_bytes(),
            b'c' => vec![args.next().unwrap_or(0) as u8],
            b's' => {
                let mut s = memory.read_cstr(args.next().unwrap_or(0))?;
                if let Some(p) = precision {
                    s.truncate(p);
                }
                s
            }
            other => {
                out.push(b'%');
                out.push(other);
                continue;
            }
        };
        pad(&mut out, &field, width, left, zero && conv != b's' && conv != b'c');
    }
    Ok(out)
}

fn pad(out: &mut Vec<u8>, field: &[u8], width: usize, left: bool, zero: bool) {
    let fill = width.saturating_sub(field.len());
    if left {
        out.extend_from_slice(field);
        out.extend(std::iter::repeat(b' ').take(fill));
    } else if zero {
        let (sign, digits) = match field.first() {
            Some(b'-') | Some(b'+') => field.split_at(1),
            _ => field.split_at(0),
        };
        out.extend_from_slice(sign);
        out.extend(std::iter::repeat(b'0').take(fill));
        out.extend_from_slice(digits);
    } else {
        out.extend(std::iter::repeat(b' ').take(fill));
        out.extend_from_slice(field);
    }
}
