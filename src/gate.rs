//! Exclusion gate: a named, cross-process binary semaphore.
//!
//! The gate is the only mutual-exclusion primitive in the system. Every
//! read-modify-write of shared state happens between `acquire` and
//! `release`; the semaphore total-orders those critical sections across
//! processes but promises nothing about the order waiting processes are
//! granted it.

use std::ffi::CString;
use std::io;

use crate::error::GateError;

pub struct Gate {
    sem: *mut libc::sem_t,
    name: CString,
}

impl Gate {
    /// Create the named gate with value 1. `AlreadyExists` signals that
    /// this process should become a joiner instead.
    pub fn create(name: &str) -> Result<Self, GateError> {
        let cname = sem_name(name)?;
        let sem = unsafe {
            libc::sem_open(
                cname.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::c_uint,
                1 as libc::c_uint,
            )
        };
        if sem == libc::SEM_FAILED {
            let err = io::Error::last_os_error();
            return Err(if err.raw_os_error() == Some(libc::EEXIST) {
                GateError::AlreadyExists(name.to_owned())
            } else {
                GateError::System(err)
            });
        }
        Ok(Gate { sem, name: cname })
    }

    /// Open an existing named gate. `NotFound` signals that no host has
    /// started (or the last participant already tore the session down).
    pub fn open(name: &str) -> Result<Self, GateError> {
        let cname = sem_name(name)?;
        let sem = unsafe { libc::sem_open(cname.as_ptr(), 0) };
        if sem == libc::SEM_FAILED {
            let err = io::Error::last_os_error();
            return Err(if err.raw_os_error() == Some(libc::ENOENT) {
                GateError::NotFound(name.to_owned())
            } else {
                GateError::System(err)
            });
        }
        Ok(Gate { sem, name: cname })
    }

    /// Block until the gate value is 1, then take it to 0. No timeout: a
    /// peer that dies inside its critical section blocks everyone (accepted
    /// failure mode).
    pub fn acquire(&self) -> Result<(), GateError> {
        if unsafe { libc::sem_wait(self.sem) } != 0 {
            return Err(GateError::System(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Non-blocking availability probe. Advisory only and free to race:
    /// callers poll this before a blocking `acquire`, and correctness rests
    /// solely on that acquire, never on the probe result.
    pub fn try_is_available(&self) -> bool {
        let mut value: libc::c_int = 0;
        if unsafe { libc::sem_getvalue(self.sem, &mut value) } != 0 {
            return false;
        }
        value > 0
    }

    /// Set the gate value back to 1, waking one waiter if any.
    pub fn release(&self) -> Result<(), GateError> {
        if unsafe { libc::sem_post(self.sem) } != 0 {
            return Err(GateError::System(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Unlink the name from the OS namespace. Only the participant doing
    /// final teardown calls this, after confirming the arena is unoccupied;
    /// from then on every `open`/`create` under this name starts fresh.
    pub fn destroy(&self) -> Result<(), GateError> {
        if unsafe { libc::sem_unlink(self.name.as_ptr()) } != 0 {
            return Err(GateError::System(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Drop for Gate {
    fn drop(&mut self) {
        unsafe {
            libc::sem_close(self.sem);
        }
    }
}

fn sem_name(name: &str) -> Result<CString, GateError> {
    CString::new(name)
        .map_err(|e| GateError::System(io::Error::new(io::ErrorKind::InvalidInput, e)))
}
