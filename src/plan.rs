//! The bundled learning plan: one verse reference per day with a topic
//! label, grouped into weeks of seven for presentation.

use std::collections::HashSet;

/// Days per presentation group.
pub const WEEK_LEN: usize = 7;

#[derive(Clone, Copy, Debug)]
pub struct PlanVerse {
  /// 1-based day index.
  pub day: u32,
  pub reference: &'static str,
  pub topic: &'static str,
}

// TODO: extend the bank to the full 365 days; the curriculum below covers
// the first four weeks.
static LEARNING_PLAN: [PlanVerse; 28] = [
  // Tuần 1: Nền Tảng
  PlanVerse { day: 1, reference: "Sáng-thế Ký 1:1", topic: "Sự Sáng Tạo" },
  PlanVerse { day: 2, reference: "Giăng 1:1", topic: "Ngôi Lời" },
  PlanVerse { day: 3, reference: "Giăng 3:16", topic: "Tình Yêu Cứu Rỗi" },
  PlanVerse { day: 4, reference: "Rô-ma 3:23", topic: "Tội Lỗi" },
  PlanVerse { day: 5, reference: "Rô-ma 6:23", topic: "Sự Cứu Chuộc" },
  PlanVerse { day: 6, reference: "Ê-phê-sô 2:8-9", topic: "Ân Điển" },
  PlanVerse { day: 7, reference: "Rô-ma 5:8", topic: "Tình Yêu của Đức Chúa Trời" },
  // Tuần 2: Tăng Trưởng
  PlanVerse { day: 8, reference: "II Cô-rinh-tô 5:17", topic: "Tạo Vật Mới" },
  PlanVerse { day: 9, reference: "Ga-la-ti 2:20", topic: "Sống bởi Đức Tin" },
  PlanVerse { day: 10, reference: "Giăng 15:5", topic: "Cứ Ở Trong Chúa" },
  PlanVerse { day: 11, reference: "Phi-líp 4:13", topic: "Sức Mạnh trong Đấng Christ" },
  PlanVerse { day: 12, reference: "Hê-bơ-rơ 12:1-2", topic: "Cuộc Đua Đức Tin" },
  PlanVerse { day: 13, reference: "II Ti-mô-thê 3:16-17", topic: "Lời Chúa" },
  PlanVerse { day: 14, reference: "Rô-ma 8:28", topic: "Mọi Sự Hiệp Lại" },
  // Tuần 3: Lời Hứa
  PlanVerse { day: 15, reference: "Giê-rê-mi 29:11", topic: "Kế Hoạch của Chúa" },
  PlanVerse { day: 16, reference: "Thi-thiên 23:1", topic: "Người Chăn Hiền Lành" },
  PlanVerse { day: 17, reference: "Ê-sai 40:31", topic: "Sức Mới" },
  PlanVerse { day: 18, reference: "Châm-ngôn 3:5-6", topic: "Tin Cậy Chúa" },
  PlanVerse { day: 19, reference: "Ma-thi-ơ 6:33", topic: "Tìm Kiếm Nước Trời" },
  PlanVerse { day: 20, reference: "Giăng 14:6", topic: "Đường Đi, Lẽ Thật, Sự Sống" },
  PlanVerse { day: 21, reference: "Ma-thi-ơ 11:28", topic: "Sự Yên Nghỉ" },
  // Tuần 4: Đời Sống Cơ Đốc
  PlanVerse { day: 22, reference: "Ga-la-ti 5:22-23", topic: "Bông Trái của Thánh Linh" },
  PlanVerse { day: 23, reference: "Ma-thi-ơ 5:16", topic: "Ánh Sáng cho Thế Gian" },
  PlanVerse { day: 24, reference: "I Cô-rinh-tô 10:31", topic: "Làm Vinh Hiển Danh Chúa" },
  PlanVerse { day: 25, reference: "I Phi-e-rơ 3:15", topic: "Sẵn Sàng Trả Lời" },
  PlanVerse { day: 26, reference: "Ma-thi-ơ 28:19-20", topic: "Đại Mạng Lệnh" },
  PlanVerse { day: 27, reference: "Hê-bơ-rơ 10:24-25", topic: "Nhóm Lại" },
  PlanVerse { day: 28, reference: "Phi-líp 2:3-4", topic: "Khiêm Nhường" },
];

pub fn learning_plan() -> &'static [PlanVerse] {
  &LEARNING_PLAN
}

/// The plan partitioned into presentation weeks.
pub fn weeks() -> Vec<&'static [PlanVerse]> {
  LEARNING_PLAN.chunks(WEEK_LEN).collect()
}

pub fn verse_for_day(day: u32) -> Option<&'static PlanVerse> {
  LEARNING_PLAN.iter().find(|v| v.day == day)
}

/// Lowest day index not yet completed; one past the end when all are done.
pub fn first_uncompleted_day(completed: &HashSet<u32>) -> u32 {
  for verse in &LEARNING_PLAN {
    if !completed.contains(&verse.day) {
      return verse.day;
    }
  }
  LEARNING_PLAN.len() as u32 + 1
}

/// Days after the first uncompleted one are locked; the current day and
/// completed days stay selectable.
pub fn is_locked(day: u32, completed: &HashSet<u32>) -> bool {
  day > first_uncompleted_day(completed)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plan_partitions_into_weeks_of_seven() {
    let weeks = weeks();
    assert_eq!(weeks.len(), 4);
    assert!(weeks.iter().all(|w| w.len() == WEEK_LEN));
  }

  #[test]
  fn day_indices_are_contiguous_from_one() {
    for (i, verse) in learning_plan().iter().enumerate() {
      assert_eq!(verse.day, i as u32 + 1);
    }
  }

  #[test]
  fn first_uncompleted_day_skips_completed_prefix() {
    assert_eq!(first_uncompleted_day(&HashSet::new()), 1);
    assert_eq!(first_uncompleted_day(&HashSet::from([1, 2])), 3);
    // A gap keeps the earlier day current.
    assert_eq!(first_uncompleted_day(&HashSet::from([2])), 1);
  }

  #[test]
  fn all_days_completed_moves_past_the_end() {
    let all: HashSet<u32> = (1..=learning_plan().len() as u32).collect();
    assert_eq!(first_uncompleted_day(&all), learning_plan().len() as u32 + 1);
  }

  #[test]
  fn days_after_the_current_one_are_locked() {
    let completed = HashSet::from([1]);
    assert!(!is_locked(1, &completed));
    assert!(!is_locked(2, &completed));
    assert!(is_locked(3, &completed));
  }
}
