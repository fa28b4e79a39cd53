//! Run-time compiled HIP kernels and launch configuration.

use crate::error::{Result, RuntimeError, check_hip};
use crate::ffi::{HIP_STREAM_DEFAULT, HipFunction, HipModule, HipStream, RtcApi, RtcProgram};
use crate::kernels::HipKernelSource;
use crate::runtime::Runtime;
use crate::stream::Stream;
use std::ffi::{CStr, CString, c_char, c_void};
use tracing::{debug, warn};

/// Grid/block dimensions for a HIP kernel launch.
#[derive(Debug, Clone, Copy)]
pub struct LaunchConfig {
    pub grid: (u32, u32, u32),
    pub block: (u32, u32, u32),
    pub shared_mem_bytes: u32,
    pub stream: HipStream,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self { grid: (1, 1, 1), block: (256, 1, 1), shared_mem_bytes: 0, stream: HIP_STREAM_DEFAULT }
    }
}

impl LaunchConfig {
    /// 1-D launch covering `n` threads.
    pub fn linear(n: u32, block_size: u32) -> Self {
        Self { grid: (n.div_ceil(block_size), 1, 1), block: (block_size, 1, 1), ..Default::default() }
    }

    /// 2-D launch over a `rows × cols` matrix: x walks columns, y walks rows.
    pub fn grid_2d(rows: u32, cols: u32, block_x: u32, block_y: u32) -> Self {
        Self {
            grid: (cols.div_ceil(block_x), rows.div_ceil(block_y), 1),
            block: (block_x, block_y, 1),
            ..Default::default()
        }
    }

    /// Launch on `stream` instead of the null stream.
    pub fn on(mut self, stream: &Stream) -> Self {
        self.stream = stream.raw();
        self
    }
}

/// Type-erased pointer to one kernel argument, as `hipModuleLaunchKernel` expects.
pub fn kernel_arg<T>(value: &T) -> *mut c_void {
    (value as *const T).cast_mut().cast()
}

fn rtc_error(rtc: &RtcApi, status: i32) -> String {
    let ptr = unsafe { (rtc.get_error_string)(status) };
    if ptr.is_null() {
        return format!("hiprtcResult({status})");
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// A HIP-RTC program, destroyed on drop.
struct Program<'a> {
    rtc: &'a RtcApi,
    raw: RtcProgram,
}

impl Program<'_> {
    fn log(&self) -> String {
        let mut size = 0usize;
        if unsafe { (self.rtc.get_program_log_size)(self.raw, &mut size) } != 0 || size == 0 {
            return String::new();
        }
        let mut buf = vec![0u8; size];
        if unsafe { (self.rtc.get_program_log)(self.raw, buf.as_mut_ptr().cast::<c_char>()) } != 0 {
            return String::new();
        }
        String::from_utf8_lossy(&buf).trim_end_matches('\0').trim().to_string()
    }
}

impl Drop for Program<'_> {
    fn drop(&mut self) {
        let status = unsafe { (self.rtc.destroy_program)(&mut self.raw) };
        if status != 0 {
            warn!(status, "failed to destroy HIP-RTC program");
        }
    }
}

/// Compile `source` to a code object with HIP-RTC.
fn compile(rtc: &RtcApi, kernel: HipKernelSource) -> Result<Vec<u8>> {
    let src = CString::new(kernel.source())
        .map_err(|e| RuntimeError::KernelCompile(format!("{}: {e}", kernel.file_name())))?;
    let name = CString::new(kernel.file_name())
        .map_err(|e| RuntimeError::KernelCompile(e.to_string()))?;

    let mut raw: RtcProgram = std::ptr::null_mut();
    let status = unsafe {
        (rtc.create_program)(
            &mut raw,
            src.as_ptr(),
            name.as_ptr(),
            0,
            std::ptr::null(),
            std::ptr::null(),
        )
    };
    if status != 0 {
        return Err(RuntimeError::KernelCompile(format!(
            "hiprtcCreateProgram({}): {}",
            kernel.file_name(),
            rtc_error(rtc, status)
        )));
    }
    let program = Program { rtc, raw };

    let status = unsafe { (rtc.compile_program)(program.raw, 0, std::ptr::null()) };
    if status != 0 {
        return Err(RuntimeError::KernelCompile(format!(
            "{}: {}\n{}",
            kernel.file_name(),
            rtc_error(rtc, status),
            program.log()
        )));
    }

    let mut size = 0usize;
    let status = unsafe { (rtc.get_code_size)(program.raw, &mut size) };
    if status != 0 {
        return Err(RuntimeError::KernelCompile(rtc_error(rtc, status)));
    }
    let mut code = vec![0u8; size];
    let status = unsafe { (rtc.get_code)(program.raw, code.as_mut_ptr().cast::<c_char>()) };
    if status != 0 {
        return Err(RuntimeError::KernelCompile(rtc_error(rtc, status)));
    }
    debug!(kernel = ?kernel, code_bytes = size, "compiled HIP kernel");
    Ok(code)
}

/// A loaded code object, unloaded on drop.
pub struct Module {
    runtime: Runtime,
    raw: HipModule,
    kernel: HipKernelSource,
}

impl Module {
    /// Compile `kernel` for the current device and load it.
    pub fn compile(runtime: &Runtime, kernel: HipKernelSource) -> Result<Self> {
        let rtc = runtime.rtc()?;
        let code = compile(&rtc, kernel)?;
        let mut raw: HipModule = std::ptr::null_mut();
        check_hip(
            unsafe { (runtime.hip().module_load_data)(&mut raw, code.as_ptr().cast()) },
            "hipModuleLoadData",
        )?;
        Ok(Self { runtime: runtime.clone(), raw, kernel })
    }

    /// Resolve the kernel's entry point.
    pub fn function(&self) -> Result<Function<'_>> {
        let name = CString::new(self.kernel.entry_point())
            .map_err(|e| RuntimeError::KernelLaunch(e.to_string()))?;
        let mut raw: HipFunction = std::ptr::null_mut();
        check_hip(
            unsafe { (self.runtime.hip().module_get_function)(&mut raw, self.raw, name.as_ptr()) },
            "hipModuleGetFunction",
        )?;
        Ok(Function { module: self, raw })
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        let status = unsafe { (self.runtime.hip().module_unload)(self.raw) };
        if let Err(e) = check_hip(status, "hipModuleUnload") {
            warn!(error = %e, "failed to unload HIP module");
        }
    }
}

/// A kernel entry point inside a loaded [`Module`].
pub struct Function<'m> {
    module: &'m Module,
    raw: HipFunction,
}

impl Function<'_> {
    /// Queue the kernel.
    ///
    /// # Safety
    /// `args` must point to values matching the kernel's parameter list in
    /// order and type, and every device pointer among them must stay valid
    /// until the launch stream is synchronised.
    pub unsafe fn launch(&self, config: &LaunchConfig, args: &mut [*mut c_void]) -> Result<()> {
        if self.raw.is_null() {
            return Err(RuntimeError::KernelLaunch("null function handle".into()));
        }
        debug!(
            kernel = self.module.kernel.entry_point(),
            grid = ?config.grid,
            block = ?config.block,
            shared_mem = config.shared_mem_bytes,
            "launching HIP kernel"
        );
        let status = unsafe {
            (self.module.runtime.hip().module_launch_kernel)(
                self.raw,
                config.grid.0,
                config.grid.1,
                config.grid.2,
                config.block.0,
                config.block.1,
                config.block.2,
                config.shared_mem_bytes,
                config.stream,
                args.as_mut_ptr(),
                std::ptr::null_mut(),
            )
        };
        check_hip(status, "hipModuleLaunchKernel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_rounds_grid_up() {
        let cfg = LaunchConfig::linear(1000, 256);
        assert_eq!(cfg.grid, (4, 1, 1));
        assert_eq!(cfg.block, (256, 1, 1));
    }

    #[test]
    fn grid_2d_maps_columns_to_x() {
        let cfg = LaunchConfig::grid_2d(255, 512, 32, 32);
        assert_eq!(cfg.grid, (16, 8, 1));
        assert_eq!(cfg.block, (32, 32, 1));
        assert!(cfg.stream.is_null());
    }
}
