mod common;

use common::{CURRENT_SLICE_START, HOUR, NOW, assert_contiguous, schedule_config};
use testbed_scheduler::domain::reservation::reservation::ReservationId;
use testbed_scheduler::domain::schedule::schedule::Schedule;
use testbed_scheduler::domain::schedule::time_slice::TimeSlice;
use testbed_scheduler::error::Error;

#[test]
fn test_initialize_aligns_and_fills_minimum_horizon() {
    let mut schedule = Schedule::new(schedule_config(8, 24 * 60, 1000));
    schedule.initialize(NOW);

    assert_eq!(schedule.len(), 24);
    assert_eq!(schedule.slices()[0].start, CURRENT_SLICE_START);
    assert!(schedule.slices()[0].contains_time(NOW));
    assert_eq!(schedule.horizon_minutes(), 24 * 60);
    assert_contiguous(schedule.slices(), 8);
    assert!(schedule.slices().iter().all(|slice| slice.free_count() == 8));
}

#[test]
fn test_extend_rounds_up_to_whole_slices() {
    let mut schedule = Schedule::new(schedule_config(4, 60, 1000));
    schedule.initialize(NOW);
    assert_eq!(schedule.len(), 1);

    assert_eq!(schedule.extend(90), 2);
    assert_eq!(schedule.extend(60), 1);
    assert_eq!(schedule.extend(0), 0);
    assert_eq!(schedule.len(), 4);
    assert_contiguous(schedule.slices(), 4);
}

#[test]
fn test_extend_of_empty_schedule_is_refused() {
    let mut schedule = Schedule::new(schedule_config(4, 60, 1000));
    assert_eq!(schedule.extend(120), 0);
    assert!(schedule.is_empty());
}

#[test]
fn test_expire_on_empty_schedule_initializes() {
    let mut schedule = Schedule::new(schedule_config(4, 6 * 60, 1000));
    schedule.expire(NOW);

    assert_eq!(schedule.len(), 6);
    assert_eq!(schedule.slices()[0].start, CURRENT_SLICE_START);
}

#[test]
fn test_expire_without_elapsed_time_keeps_extension() {
    let mut schedule = Schedule::new(schedule_config(4, 6 * 60, 1000));
    schedule.initialize(NOW);
    schedule.extend(3 * 60);
    let before = schedule.clone();

    schedule.expire(NOW);

    assert_eq!(schedule, before);
    assert_eq!(schedule.len(), 9);
}

#[test]
fn test_expire_drops_past_slices_and_refills_horizon() {
    let mut schedule = Schedule::new(schedule_config(4, 6 * 60, 1000));
    schedule.initialize(NOW);

    let later = NOW + 2 * HOUR;
    schedule.expire(later);

    assert_eq!(schedule.slices()[0].start, CURRENT_SLICE_START + 2 * HOUR);
    assert!(schedule.slices()[0].contains_time(later));
    assert_eq!(schedule.len(), 6);
    assert_contiguous(schedule.slices(), 4);
}

#[test]
fn test_expire_keeps_stamps_of_future_slices() {
    let config = schedule_config(4, 6 * 60, 1000);
    let id = ReservationId::new(77).unwrap();

    let mut slices: Vec<TimeSlice> = (0..6).map(|i| TimeSlice::new(CURRENT_SLICE_START + i * HOUR, CURRENT_SLICE_START + (i + 1) * HOUR - 1, 4)).collect();
    slices[1].stamp(&[0, 1], id);
    slices[4].stamp(&[2, 3], id);

    let mut schedule = Schedule::from_slices(config, slices).unwrap();
    schedule.expire(NOW + 2 * HOUR);

    assert_eq!(schedule.slices()[0].start, CURRENT_SLICE_START + 2 * HOUR);
    assert_eq!(schedule.slices()[2].indices_of(id), vec![2, 3]);
    assert!(schedule.slices().iter().all(|slice| slice.occupant(0) != Some(id)));
    assert_eq!(schedule.len(), 6);
}

#[test]
fn test_fully_expired_schedule_is_rebuilt() {
    let mut schedule = Schedule::new(schedule_config(4, 3 * 60, 1000));
    schedule.initialize(NOW);

    let much_later = NOW + 30 * 24 * HOUR;
    schedule.expire(much_later);

    assert_eq!(schedule.len(), 3);
    assert!(schedule.slices()[0].contains_time(much_later));
    assert_contiguous(schedule.slices(), 4);
}

#[test]
fn test_release_frees_every_slice() {
    let config = schedule_config(4, 3 * 60, 1000);
    let id = ReservationId::new(3).unwrap();

    let mut slices: Vec<TimeSlice> = (0..3).map(|i| TimeSlice::new(CURRENT_SLICE_START + i * HOUR, CURRENT_SLICE_START + (i + 1) * HOUR - 1, 4)).collect();
    slices[1].stamp(&[1, 2], id);
    slices[2].stamp(&[1, 2], id);

    let mut schedule = Schedule::from_slices(config, slices).unwrap();
    assert!(schedule.contains_reservation(id));
    assert_eq!(schedule.release(id), 4);
    assert!(!schedule.contains_reservation(id));
}

#[test]
fn test_restore_rejects_broken_schedules() {
    let config = schedule_config(4, 60, 1000);

    let gap = vec![TimeSlice::new(0, HOUR - 1, 4), TimeSlice::new(HOUR + 60, 2 * HOUR - 1, 4)];
    assert!(matches!(Schedule::from_slices(config, gap), Err(Error::PersistenceError(_))));

    let narrow = vec![TimeSlice::new(0, HOUR - 1, 3)];
    assert!(matches!(Schedule::from_slices(config, narrow), Err(Error::PersistenceError(_))));

    assert!(Schedule::from_slices(config, Vec::new()).unwrap().is_empty());
}

#[test]
fn test_extend_is_capped_at_max_slices() {
    let mut schedule = Schedule::new(schedule_config(4, 2 * 60, 10));
    schedule.initialize(NOW);
    assert_eq!(schedule.len(), 2);

    assert_eq!(schedule.extend(i64::MAX), 8);
    assert_eq!(schedule.len(), 10);
    assert_eq!(schedule.extend(60), 0);
    assert_contiguous(schedule.slices(), 4);
}

#[test]
fn test_slice_count_of_huge_durations_does_not_overflow() {
    let config = schedule_config(4, 60, 10);

    assert_eq!(config.slices_for_minutes(i64::MAX), (i64::MAX as u64).div_ceil(60) as usize);
    assert_eq!(config.slices_for_minutes(i64::MIN), 0);
    assert_eq!(config.slices_for_minutes(61), 2);
}
