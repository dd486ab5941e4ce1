//! In-process stand-in for the D3D12 runtime.
//!
//! Resources are plain heap objects with an intrusive reference count, and
//! every allocation is recorded in a shared [`SoftLedger`] so callers can
//! check that nothing leaked. Failures can be injected to exercise the error
//! paths of the backend without a GPU.

use super::driver::{DescriptorHeapInfo, Dx12Context, Dx12Driver};
use super::native::{
    AllocationDesc, ClearValue, CpuDescriptorHandle, DxgiFormat, HResult, HeapType, ResourceDesc,
    ResourceDimension, ResourceFlags, ResourceStates, ShaderResourceViewDesc,
};
use crate::utils::{RefCountPtr, RefCounted};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

/// Placement alignment of committed resources.
pub const RESOURCE_ALIGNMENT: u64 = 64 * 1024;

const DESCRIPTOR_INCREMENT: u32 = 32;
const DESCRIPTOR_HEAP_BASE: usize = 0x0010_0000;

/// Counters kept by the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoftStats {
    pub resources_created: u32,
    pub live_resources: u32,
    pub live_allocations: u32,
    pub allocated_bytes: u64,
    pub views_created: u32,
    pub descriptor_heaps: u32,
}

#[derive(Default)]
struct LedgerState {
    stats: Cell<SoftStats>,
    budget: Cell<Option<u64>>,
    failing_allocations: Cell<u32>,
    debug_layer: Cell<bool>,
    gpu_based_validation: Cell<bool>,
    descriptors: RefCell<HashMap<usize, ShaderResourceViewDesc>>,
}

impl LedgerState {
    fn update(&self, f: impl FnOnce(&mut SoftStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

/// Shared view of what the soft runtime currently holds.
#[derive(Clone, Default)]
pub struct SoftLedger(Rc<LedgerState>);

impl SoftLedger {
    pub fn stats(&self) -> SoftStats {
        self.0.stats.get()
    }

    /// Makes the next `count` resource creations fail with `E_OUTOFMEMORY`.
    pub fn fail_next_allocations(&self, count: u32) {
        self.0.failing_allocations.set(count);
    }

    pub fn set_memory_budget(&self, budget: Option<u64>) {
        self.0.budget.set(budget);
    }

    pub fn debug_layer_enabled(&self) -> bool {
        self.0.debug_layer.get()
    }

    pub fn gpu_based_validation_enabled(&self) -> bool {
        self.0.gpu_based_validation.get()
    }

    /// The last view written to `handle`, if any.
    pub fn descriptor(&self, handle: CpuDescriptorHandle) -> Option<ShaderResourceViewDesc> {
        self.0.descriptors.borrow().get(&handle.ptr).copied()
    }

    /// True when every resource and allocation has been released.
    pub fn is_clean(&self) -> bool {
        let stats = self.stats();
        stats.live_resources == 0 && stats.live_allocations == 0 && stats.allocated_bytes == 0
    }
}

impl fmt::Debug for SoftLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SoftLedger").field(&self.stats()).finish()
    }
}

pub struct SoftDriver {
    ledger: SoftLedger,
    debug_layer_available: bool,
    context_failure: Option<HResult>,
}

impl Default for SoftDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftDriver {
    pub fn new() -> Self {
        Self {
            ledger: SoftLedger::default(),
            debug_layer_available: true,
            context_failure: None,
        }
    }

    /// Behaves like a machine without the Graphics Tools installed.
    pub fn without_debug_layer(mut self) -> Self {
        self.debug_layer_available = false;
        self
    }

    /// Makes device creation fail with `result`.
    pub fn with_context_failure(mut self, result: HResult) -> Self {
        self.context_failure = Some(result);
        self
    }

    pub fn with_memory_budget(self, bytes: u64) -> Self {
        self.ledger.set_memory_budget(Some(bytes));
        self
    }

    pub fn ledger(&self) -> SoftLedger {
        self.ledger.clone()
    }
}

impl Dx12Driver for SoftDriver {
    type Context = SoftContext;

    fn enable_debug_layer(&self) -> Result<(), HResult> {
        if !self.debug_layer_available {
            return Err(HResult::E_NOINTERFACE);
        }
        self.ledger.0.debug_layer.set(true);
        Ok(())
    }

    fn enable_gpu_based_validation(&self) -> Result<(), HResult> {
        if !self.ledger.debug_layer_enabled() {
            return Err(HResult::E_FAIL);
        }
        self.ledger.0.gpu_based_validation.set(true);
        Ok(())
    }

    fn create_context(&self, debug: bool) -> Result<SoftContext, HResult> {
        if let Some(result) = self.context_failure {
            return Err(result);
        }
        Ok(SoftContext {
            ledger: self.ledger.clone(),
            debug,
        })
    }
}

pub struct SoftContext {
    ledger: SoftLedger,
    debug: bool,
}

impl SoftContext {
    pub fn ledger(&self) -> &SoftLedger {
        &self.ledger
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }
}

/// A simulated `ID3D12Resource`. Lives on the heap until its last reference
/// is released.
pub struct SoftResource {
    refs: Cell<u32>,
    desc: ResourceDesc,
    state: ResourceStates,
    clear_value: Option<ClearValue>,
    name: RefCell<Option<String>>,
    ledger: SoftLedger,
}

impl SoftResource {
    pub fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    pub fn state(&self) -> ResourceStates {
        self.state
    }

    pub fn clear_value(&self) -> Option<ClearValue> {
        self.clear_value
    }

    pub fn name(&self) -> Option<String> {
        self.name.borrow().clone()
    }

    pub fn ref_count(&self) -> u32 {
        self.refs.get()
    }
}

unsafe impl RefCounted for SoftResource {
    fn add_ref(&self) -> u32 {
        let refs = self.refs.get() + 1;
        self.refs.set(refs);
        refs
    }

    unsafe fn release(this: NonNull<Self>) -> u32 {
        let refs = {
            let resource = this.as_ref();
            let refs = resource.refs.get() - 1;
            resource.refs.set(refs);
            if refs == 0 {
                resource.ledger.0.update(|s| s.live_resources -= 1);
            }
            refs
        };
        if refs == 0 {
            drop(Box::from_raw(this.as_ptr()));
        }
        refs
    }
}

/// Memory backing one resource; freed on drop.
#[derive(Debug)]
pub struct SoftAllocation {
    size: u64,
    heap_type: HeapType,
    ledger: SoftLedger,
}

impl SoftAllocation {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn heap_type(&self) -> HeapType {
        self.heap_type
    }
}

impl Drop for SoftAllocation {
    fn drop(&mut self) {
        let size = self.size;
        self.ledger.0.update(|s| {
            s.live_allocations -= 1;
            s.allocated_bytes -= size;
        });
    }
}

#[derive(Debug)]
pub struct SoftDescriptorHeap {
    pub capacity: u32,
}

/// `D3D12_REQ_TEXTURE1D_U_DIMENSION` and `D3D12_REQ_TEXTURE2D_U_OR_V_DIMENSION`.
pub const MAX_TEXTURE_DIMENSION_2D: u64 = 16384;
/// `D3D12_REQ_TEXTURE3D_U_V_OR_W_DIMENSION`.
pub const MAX_TEXTURE_DIMENSION_3D: u64 = 2048;
/// `D3D12_REQ_TEXTURE2D_ARRAY_AXIS_DIMENSION`.
pub const MAX_TEXTURE_ARRAY_LAYERS: u64 = 2048;

fn align_up(value: u64, alignment: u64) -> Option<u64> {
    Some(value.checked_add(alignment - 1)? / alignment * alignment)
}

/// Length of the full mip chain for the largest extent.
fn full_mip_chain(largest: u64) -> u32 {
    u64::BITS - largest.leading_zeros()
}

/// Bytes a resource occupies, or `E_INVALIDARG` for descriptions the runtime
/// would reject.
fn resource_size(desc: &ResourceDesc, clear_value: Option<&ClearValue>) -> Result<u64, HResult> {
    if desc.width == 0 || desc.height == 0 || desc.depth_or_array_size == 0 {
        return Err(HResult::E_INVALIDARG);
    }

    if desc.dimension == ResourceDimension::Buffer {
        if desc.format != DxgiFormat::UNKNOWN || clear_value.is_some() {
            return Err(HResult::E_INVALIDARG);
        }
        return align_up(desc.width, RESOURCE_ALIGNMENT).ok_or(HResult::E_INVALIDARG);
    }

    let texel = desc.format.texel_size().ok_or(HResult::E_INVALIDARG)? as u64;
    let depth_format = desc.format.is_depth_family();
    if desc.flags.contains(ResourceFlags::ALLOW_DEPTH_STENCIL) && !depth_format
        || desc.flags.contains(ResourceFlags::ALLOW_RENDER_TARGET) && depth_format
    {
        return Err(HResult::E_INVALIDARG);
    }
    if clear_value.is_some_and(|c| c.format().typeless() != desc.format.typeless()) {
        return Err(HResult::E_INVALIDARG);
    }

    let width = desc.width;
    let height = desc.height as u64;
    let (depth, layers) = match desc.dimension {
        ResourceDimension::Texture3D => (desc.depth_or_array_size as u64, 1),
        _ => (1, desc.depth_or_array_size as u64),
    };
    let within_limits = match desc.dimension {
        ResourceDimension::Texture1D => width <= MAX_TEXTURE_DIMENSION_2D && height == 1,
        ResourceDimension::Texture3D => {
            width <= MAX_TEXTURE_DIMENSION_3D
                && height <= MAX_TEXTURE_DIMENSION_3D
                && depth <= MAX_TEXTURE_DIMENSION_3D
        }
        _ => width <= MAX_TEXTURE_DIMENSION_2D && height <= MAX_TEXTURE_DIMENSION_2D,
    };
    if !within_limits || layers > MAX_TEXTURE_ARRAY_LAYERS {
        return Err(HResult::E_INVALIDARG);
    }

    let full_chain = full_mip_chain(width.max(height).max(depth));
    let mips = match desc.mip_levels as u32 {
        0 => full_chain,
        mips if mips > full_chain => return Err(HResult::E_INVALIDARG),
        mips => mips,
    };

    let mut bytes = 0u64;
    for mip in 0..mips {
        let w = (width >> mip).max(1);
        let h = (height >> mip).max(1);
        let d = (depth >> mip).max(1);
        let level = w
            .checked_mul(h)
            .and_then(|t| t.checked_mul(d))
            .and_then(|t| t.checked_mul(texel))
            .ok_or(HResult::E_INVALIDARG)?;
        bytes = bytes.checked_add(level).ok_or(HResult::E_INVALIDARG)?;
    }
    bytes
        .checked_mul(layers)
        .and_then(|total| align_up(total, RESOURCE_ALIGNMENT))
        .ok_or(HResult::E_INVALIDARG)
}

impl Dx12Context for SoftContext {
    type Resource = SoftResource;
    type Allocation = SoftAllocation;
    type DescriptorHeap = SoftDescriptorHeap;

    fn adapter_name(&self) -> &str {
        "Slate Soft Adapter"
    }

    fn create_resource(
        &self,
        allocation: &AllocationDesc,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> Result<(SoftAllocation, RefCountPtr<SoftResource>), HResult> {
        let state = &self.ledger.0;
        let failing = state.failing_allocations.get();
        if failing > 0 {
            state.failing_allocations.set(failing - 1);
            return Err(HResult::E_OUTOFMEMORY);
        }

        let size = resource_size(desc, clear_value)?;
        let stats = state.stats.get();
        if let Some(budget) = state.budget.get() {
            if stats.allocated_bytes.saturating_add(size) > budget {
                return Err(HResult::E_OUTOFMEMORY);
            }
        }

        state.update(|s| {
            s.resources_created += 1;
            s.live_resources += 1;
            s.live_allocations += 1;
            s.allocated_bytes += size;
        });

        let resource = Box::into_raw(Box::new(SoftResource {
            refs: Cell::new(1),
            desc: *desc,
            state: initial_state,
            clear_value: clear_value.copied(),
            name: RefCell::new(None),
            ledger: self.ledger.clone(),
        }));
        let allocation = SoftAllocation {
            size,
            heap_type: allocation.heap_type,
            ledger: self.ledger.clone(),
        };
        // SAFETY: freshly boxed with one reference, which the pointer adopts.
        let resource = unsafe { RefCountPtr::from_raw(resource, false) };
        Ok((allocation, resource))
    }

    fn set_name(&self, resource: &SoftResource, name: &str) {
        *resource.name.borrow_mut() = Some(name.to_owned());
    }

    fn create_descriptor_heap(
        &self,
        capacity: u32,
    ) -> Result<DescriptorHeapInfo<SoftDescriptorHeap>, HResult> {
        if capacity == 0 {
            return Err(HResult::E_INVALIDARG);
        }
        let index = self.ledger.stats().descriptor_heaps as usize;
        self.ledger.0.update(|s| s.descriptor_heaps += 1);
        Ok(DescriptorHeapInfo {
            heap: SoftDescriptorHeap { capacity },
            cpu_start: CpuDescriptorHandle {
                ptr: DESCRIPTOR_HEAP_BASE * (index + 1),
            },
            increment: DESCRIPTOR_INCREMENT,
        })
    }

    fn create_shader_resource_view(
        &self,
        _resource: &SoftResource,
        desc: &ShaderResourceViewDesc,
        dest: CpuDescriptorHandle,
    ) {
        self.ledger.0.descriptors.borrow_mut().insert(dest.ptr, *desc);
        self.ledger.0.update(|s| s.views_created += 1);
    }
}
