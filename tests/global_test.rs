mod common;

use std::sync::OnceLock;

use kalloc::{kalloc, kfree, kinit, kmem, FrameError, PhysicalAddress, ALLOC_JUNK, PAGE_SIZE};

const FRAMES: usize = 32;

#[repr(C, align(4096))]
struct Page([u8; PAGE_SIZE]);

// The leaked RAM lives for the whole test binary.
static RAM: OnceLock<(PhysicalAddress, PhysicalAddress)> = OnceLock::new();

/// Sets up the kernel allocator once over leaked, identity-mapped host pages.
fn ram() -> (PhysicalAddress, PhysicalAddress) {
    common::init_test_logger();

    *RAM.get_or_init(|| {
        let pages: Vec<Page> = (0..FRAMES).map(|_| Page([0; PAGE_SIZE])).collect();
        let pages = Box::leak(pages.into_boxed_slice());
        let start = pages.as_mut_ptr() as PhysicalAddress;
        let end = start + FRAMES * PAGE_SIZE;
        unsafe { kinit(start, end).unwrap() };
        (start, end)
    })
}

fn bytes(pa: PhysicalAddress) -> &'static [u8] {
    unsafe { std::slice::from_raw_parts(pa as *const u8, PAGE_SIZE) }
}

#[test]
fn kalloc_and_kfree() {
    let (start, end) = ram();

    let pa = kalloc().unwrap();
    assert!(pa >= start && pa < end);
    assert_eq!(pa % PAGE_SIZE, 0);
    assert!(bytes(pa).iter().all(|&b| b == ALLOC_JUNK));
    assert_eq!(kmem().unwrap().ref_count_of(pa), Ok(1));

    kfree(pa);
    assert_eq!(kmem().unwrap().ref_count_of(pa), Ok(0));
}

#[test]
fn kfree_of_shared_frame() {
    ram();
    let kmem = kmem().unwrap();

    let pa = kalloc().unwrap();
    kmem.share(pa).unwrap();
    kfree(pa);
    assert_eq!(kmem.ref_count_of(pa), Ok(1));
    assert!(bytes(pa).iter().all(|&b| b == ALLOC_JUNK));
    kfree(pa);
    assert_eq!(kmem.ref_count_of(pa), Ok(0));
}

#[test]
fn kinit_twice_is_refused() {
    let (start, end) = ram();
    assert_eq!(unsafe { kinit(start, end) }, Err(FrameError::AlreadyInitialized));
    assert_eq!(kmem().unwrap().frame_count(), FRAMES);
}

#[test]
fn kmem_covers_leaked_ram() {
    let (start, end) = ram();
    let kmem = kmem().unwrap();
    assert_eq!(kmem.range().start(), start);
    assert_eq!(kmem.range().end(), end);
    assert!(kmem.contains(start));
    assert!(!kmem.contains(end));
}

#[test]
#[should_panic(expected = "kfree")]
fn kfree_misaligned_panics() {
    let (start, _) = ram();
    kfree(start + 1);
}

#[test]
#[should_panic(expected = "kfree")]
fn kfree_below_range_panics() {
    let (start, _) = ram();
    kfree(start - PAGE_SIZE);
}
