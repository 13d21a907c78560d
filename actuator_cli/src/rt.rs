//! Real-time scheduling for the control loop (Linux SCHED_FIFO / affinity / mlockall).

use crate::cli::{RtArgs, RtLock};

/// Apply the requested real-time settings once per process. Every step is
/// best-effort: failures are logged and the loop runs without them.
pub fn setup_rt_once(args: RtArgs) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !args.rt {
        return;
    }
    RT_ONCE.get_or_init(|| apply(args));
}

#[cfg(target_os = "linux")]
fn apply(args: RtArgs) {
    let lock = args.rt_lock.unwrap_or(RtLock::os_default());
    match linux::lock_memory(lock) {
        Ok(()) => tracing::info!(?lock, "RT: memory lock applied"),
        Err(err) => tracing::warn!(error = %err, "RT: mlockall failed"),
    }
    match linux::fifo_priority(args.rt_prio) {
        Ok(prio) => tracing::info!(prio, "RT: SCHED_FIFO enabled"),
        Err(err) => tracing::warn!(error = %err, "RT: sched_setscheduler(SCHED_FIFO) failed"),
    }
    let cpu = args.rt_cpu.unwrap_or(0);
    match linux::pin_to_cpu(cpu) {
        Ok(()) => tracing::info!(cpu, "RT: pinned to CPU"),
        Err(err) => tracing::warn!(error = %err, cpu, "RT: affinity not applied"),
    }
}

#[cfg(not(target_os = "linux"))]
fn apply(args: RtArgs) {
    let _ = args;
    tracing::warn!("RT: real-time mode is only supported on Linux; running without it");
}

#[cfg(target_os = "linux")]
mod linux {
    use super::RtLock;
    use libc::{
        CPU_ISSET, CPU_SET, CPU_ZERO, MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, cpu_set_t, mlockall,
        sched_get_priority_max, sched_get_priority_min, sched_param, sched_setscheduler,
    };

    /// Capacity of cpu_set_t in CPU indices (bits).
    const MAX_CPUSET_BITS: usize = std::mem::size_of::<cpu_set_t>() * 8;

    fn os_result(rc: libc::c_int) -> std::io::Result<()> {
        if rc == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    fn memlock_hint() -> Option<String> {
        let mut rlim = std::mem::MaybeUninit::<libc::rlimit>::uninit();
        let rlim = unsafe {
            if libc::getrlimit(libc::RLIMIT_MEMLOCK, rlim.as_mut_ptr()) != 0 {
                return None;
            }
            rlim.assume_init()
        };
        Some(if rlim.rlim_cur == libc::RLIM_INFINITY {
            "memlock limit: unlimited".to_string()
        } else {
            format!("memlock limit: {} KiB", rlim.rlim_cur / 1024)
        })
    }

    /// Lock the address space; `All` falls back to `Current` on EPERM/ENOMEM.
    pub fn lock_memory(lock: RtLock) -> eyre::Result<()> {
        let flags = match lock {
            RtLock::None => return Ok(()),
            RtLock::Current => MCL_CURRENT,
            RtLock::All => MCL_CURRENT | MCL_FUTURE,
        };
        let Err(err) = os_result(unsafe { mlockall(flags) }) else {
            return Ok(());
        };
        let retryable = matches!(err.raw_os_error(), Some(code) if code == libc::EPERM || code == libc::ENOMEM);
        if lock == RtLock::All && retryable && os_result(unsafe { mlockall(MCL_CURRENT) }).is_ok()
        {
            tracing::warn!(error = %err, "RT: mlockall(current|future) failed; locked current pages only");
            return Ok(());
        }
        let mut msg = format!("mlockall({lock:?}) failed: {err}");
        if retryable {
            if let Some(h) = memlock_hint() {
                msg.push_str(&format!("; {h}"));
            }
            msg.push_str("; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'");
        }
        Err(eyre::eyre!(msg))
    }

    /// Switch to SCHED_FIFO with `prio` clamped to the system range (default: max).
    pub fn fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
        let (min, max) = unsafe {
            (
                sched_get_priority_min(SCHED_FIFO),
                sched_get_priority_max(SCHED_FIFO),
            )
        };
        let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
        let prio = prio.unwrap_or(max).clamp(min, max);
        let param = sched_param {
            sched_priority: prio,
        };
        os_result(unsafe { sched_setscheduler(0, SCHED_FIFO, &param) }).map_err(|e| {
            eyre::eyre!(
                "{e}; hint: needs CAP_SYS_NICE or root ('sudo setcap cap_sys_nice=ep /path/to/actuator')"
            )
        })?;
        Ok(prio)
    }

    /// Pin the process to `cpu` if the current affinity mask allows it.
    pub fn pin_to_cpu(cpu: usize) -> eyre::Result<()> {
        if cpu >= MAX_CPUSET_BITS {
            eyre::bail!("requested CPU {cpu} exceeds cpu_set_t capacity {MAX_CPUSET_BITS}");
        }
        let mut allowed: cpu_set_t = unsafe { std::mem::zeroed() };
        os_result(unsafe {
            libc::sched_getaffinity(0, std::mem::size_of::<cpu_set_t>(), &mut allowed)
        })?;
        if !unsafe { CPU_ISSET(cpu, &allowed) } {
            eyre::bail!("CPU {cpu} not permitted by current affinity mask");
        }
        let mut desired: cpu_set_t = unsafe { std::mem::zeroed() };
        unsafe {
            CPU_ZERO(&mut desired);
            CPU_SET(cpu, &mut desired);
        }
        os_result(unsafe {
            libc::sched_setaffinity(0, std::mem::size_of::<cpu_set_t>(), &desired)
        })?;
        Ok(())
    }
}
