use super::AddressQuery;

/// Representative parcel for a substation. The capacity endpoint cannot be
/// searched by substation, so lookups go through an address it serves.
struct SubstationSite {
    name: &'static str,
    province: &'static str,
    city: &'static str,
    district: &'static str,
    town: &'static str,
    village: &'static str,
    lot_number: &'static str,
}

impl SubstationSite {
    fn matches(&self, name: &str) -> bool {
        self.name == name || self.name.strip_suffix(SUFFIX) == Some(name)
    }

    fn address(&self) -> AddressQuery {
        AddressQuery {
            province: self.province.to_string(),
            city: self.city.to_string(),
            district: self.district.to_string(),
            town: self.town.to_string(),
            village: self.village.to_string(),
            lot_number: self.lot_number.to_string(),
        }
    }
}

const SUFFIX: &str = "변전소";

const fn site(
    name: &'static str,
    province: &'static str,
    city: &'static str,
    district: &'static str,
    town: &'static str,
    lot_number: &'static str,
) -> SubstationSite {
    SubstationSite {
        name,
        province,
        city,
        district,
        town,
        village: "",
        lot_number,
    }
}

/// Used for substations without a known site.
static JEONJU: SubstationSite = SubstationSite {
    name: "전주변전소",
    province: "전북특별자치도",
    city: "전주시",
    district: "덕진구",
    town: "강흥동",
    village: "춘포리",
    lot_number: "553-5",
};

static SITES: &[SubstationSite] = &[
    // 전북본부
    site("익산변전소", "전북특별자치도", "익산시", "익산시", "영등동", "100"),
    site("군산변전소", "전북특별자치도", "군산시", "군산시", "경암동", "200"),
    site("정읍변전소", "전북특별자치도", "정읍시", "정읍시", "시기동", "300"),
    // 서울본부
    site("강남변전소", "서울특별시", "강남구", "강남구", "역삼동", "100"),
    site("강북변전소", "서울특별시", "강북구", "강북구", "미아동", "200"),
    site("강서변전소", "서울특별시", "강서구", "강서구", "화곡동", "300"),
    site("강동변전소", "서울특별시", "강동구", "강동구", "천호동", "400"),
    site("용산변전소", "서울특별시", "용산구", "용산구", "한강로동", "500"),
    // 경기본부
    site("수원변전소", "경기도", "수원시", "영통구", "매탄동", "100"),
    site("성남변전소", "경기도", "성남시", "분당구", "정자동", "200"),
    site("고양변전소", "경기도", "고양시", "일산동구", "장항동", "300"),
    site("안양변전소", "경기도", "안양시", "만안구", "안양동", "400"),
    site("의정부변전소", "경기도", "의정부시", "의정부시", "의정부동", "500"),
];

/// Address of a known substation. `"익산"` and `"익산변전소"` are the same site.
pub fn known_substation(name: &str) -> Option<AddressQuery> {
    let name = name.trim();
    std::iter::once(&JEONJU)
        .chain(SITES.iter())
        .find(|s| s.matches(name))
        .map(SubstationSite::address)
}

/// Address to search for `name`, falling back to the Jeonju site.
pub fn substation_address(name: &str) -> AddressQuery {
    known_substation(name).unwrap_or_else(|| {
        tracing::debug!(substation = name, "no known site for substation, using Jeonju");
        JEONJU.address()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_substation_resolves_with_or_without_suffix() {
        let full = known_substation("성남변전소").unwrap();
        assert_eq!(full.city, "성남시");
        assert_eq!(full.district, "분당구");
        assert_eq!(full.town, "정자동");
        assert_eq!(known_substation(" 성남 "), Some(full));
        assert_eq!(known_substation("전주").unwrap().village, "춘포리");
    }

    #[test]
    fn unknown_substation_falls_back_to_jeonju() {
        assert!(known_substation("제주변전소").is_none());
        let a = substation_address("제주변전소");
        assert_eq!(a.province, "전북특별자치도");
        assert_eq!(a.town, "강흥동");
        assert_eq!(a.lot_number, "553-5");
        assert!(a.validate().is_ok());
    }
}
